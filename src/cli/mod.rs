//! Command-line interface for feeder-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **classify**: Show how markings resolve and classify
//! - **associate**: Match a position file against a station catalog and export a program
//! - **stations**: List a station catalog with the parts each station supplies
//! - **config**: Show or export the alias/ignore configuration
//! - **serve**: Start the HTTP API
//!
//! ## Usage
//!
//! ```text
//! # How does a marking classify?
//! feeder-solver classify 4.7k 100n Q_NMOS_GSD
//!
//! # Associate and write a DPV program
//! feeder-solver associate --positions board-top.csv --stations feeders.csv --output board.dpv
//!
//! # JSON output for scripting
//! feeder-solver associate --positions board-top.csv --stations feeders.json --format json
//!
//! # Start the API server
//! feeder-solver serve --port 8080 --open
//! ```

use clap::{Parser, Subcommand};

pub mod associate;
pub mod classify;
pub mod config;
pub mod stations;

#[derive(Parser)]
#[command(name = "feeder-solver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Associate BOM parts with pick-and-place feeder stations")]
#[command(
    long_about = "feeder-solver matches every part in a position file to the feeder station that holds its component.\n\nMarkings such as 4.7k, 0.1u or 10A are normalized before matching, so equivalent spellings find the same station. Alias and ignore tables cover part numbers that differ between exports and parts that are never placed. The result can be written as a DPV program for the pick-and-place machine."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how markings resolve and classify
    Classify(classify::ClassifyArgs),

    /// Associate parts with stations and optionally export a DPV program
    Associate(associate::AssociateArgs),

    /// List stations and the parts they supply
    Stations(stations::StationsArgs),

    /// Manage the alias/ignore configuration
    Config(config::ConfigArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
