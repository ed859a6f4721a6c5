use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::catalog::store::StationStore;
use crate::cli::OutputFormat;
use crate::core::marking::ClassifiedMarking;
use crate::core::station::StationRecord;
use crate::core::types::StationId;
use crate::matching::association::AssociationEngine;
use crate::matching::resolver::AssociationConfig;
use crate::parsing::positions::parse_positions_file;
use crate::parsing::stations::parse_stations_file;

#[derive(Args)]
pub struct StationsArgs {
    /// Station catalog (CSV, or JSON when the extension is .json)
    #[arg(long, required = true)]
    pub stations: PathBuf,

    /// Position file whose parts are associated and listed per station
    #[arg(long)]
    pub positions: Option<PathBuf>,

    /// Path to an alias/ignore config (defaults to embedded)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
struct StationListing<'a> {
    #[serde(flatten)]
    station: &'a StationRecord,
    classification: ClassifiedMarking,
    parts: Vec<&'a str>,
}

/// Execute stations subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be parsed or output fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: StationsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let stations = parse_stations_file(&args.stations)?;
    if verbose {
        eprintln!("Loaded {} stations", stations.len());
    }

    let engine = match &args.positions {
        Some(path) => {
            let config = AssociationConfig::load(args.config.as_deref())?;
            let parts = parse_positions_file(path)?;
            let mut engine = AssociationEngine::from_records(parts, stations, &config);
            engine.auto_associate_all();
            engine
        }
        None => AssociationEngine::from_records(
            Vec::new(),
            stations,
            &AssociationConfig::default(),
        ),
    };

    let listings = build_listings(&engine);

    match format {
        OutputFormat::Text => print_text(&listings),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings)?),
        OutputFormat::Tsv => {
            println!("id\tnote\tkind\tnozzle\trotation\tparts");
            for listing in &listings {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    listing.station.id,
                    listing.station.note,
                    listing.classification.kind,
                    listing.station.nozzle.as_deref().unwrap_or(""),
                    listing.station.rotation,
                    listing.parts.join(","),
                );
            }
        }
    }

    Ok(())
}

/// Stations sorted by ID, each with the references it supplies
fn build_listings(engine: &AssociationEngine) -> Vec<StationListing<'_>> {
    let mut by_station: HashMap<&StationId, Vec<&str>> = HashMap::new();
    for part in engine.parts().iter() {
        if let Some(station) = engine.resolved_station(part) {
            by_station
                .entry(&station.id)
                .or_default()
                .push(part.reference.as_str());
        }
    }

    let stations: &StationStore = engine.stations();
    stations
        .sorted_by_id()
        .into_iter()
        .map(|station| StationListing {
            station,
            classification: station.classified_note(),
            parts: by_station.remove(&station.id).unwrap_or_default(),
        })
        .collect()
}

fn print_text(listings: &[StationListing<'_>]) {
    let note_width = listings
        .iter()
        .map(|l| l.station.note.len().min(30))
        .max()
        .unwrap_or(4)
        .max(4);

    println!("Stations ({})\n", listings.len());
    println!(
        "{:<6}  {:<note_width$}  {:<10}  {:<6}  Parts",
        "ID", "Note", "Kind", "Nozzle"
    );
    println!("{}", "-".repeat(note_width + 40));

    for listing in listings {
        println!(
            "{:<6}  {:<note_width$}  {:<10}  {:<6}  {}",
            listing.station.id.as_str(),
            listing.station.note,
            listing.classification.kind.to_string(),
            listing.station.nozzle.as_deref().unwrap_or(""),
            listing.parts.join(", "),
        );
    }
}
