use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::OutputFormat;
use crate::matching::resolver::AssociationConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the alias and ignore tables
    Show {
        /// Path to a config file (defaults to embedded)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export the config to a file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to a config file to export (defaults to embedded)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Execute config subcommand
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or written.
pub fn run(args: ConfigArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show { config } => run_show(config, format),
        ConfigCommands::Export { output, config } => run_export(output, config),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn run_show(config_path: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let config = AssociationConfig::load(config_path.as_deref())?;

    match format {
        OutputFormat::Text => {
            println!("Association config (v{})\n", config.version);
            println!("Aliases:");
            for (canonical, aliases) in &config.aliases {
                println!("  {:<15} <- {}", canonical, aliases.join(", "));
            }
            println!("\nIgnored: {}", config.ignore.join(", "));
        }
        OutputFormat::Json => println!("{}", config.to_json()?),
        OutputFormat::Tsv => {
            println!("canonical\talias");
            for (canonical, aliases) in &config.aliases {
                for alias in aliases {
                    println!("{canonical}\t{alias}");
                }
            }
            for ignored in &config.ignore {
                println!("-\t{ignored}");
            }
        }
    }

    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn run_export(output: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AssociationConfig::load(config_path.as_deref())?;

    let json = config.to_json()?;
    std::fs::write(&output, json)?;

    println!(
        "Exported {} alias groups and {} ignored markings to {}",
        config.aliases.len(),
        config.ignore.len(),
        output.display()
    );

    Ok(())
}
