use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::component::ComponentRecord;
use crate::export::dpv::{generate_now, ExportOptions, ExportSummary};
use crate::matching::association::{AssociationEngine, AssociationReport, PartFilter, SideFilter};
use crate::matching::resolver::AssociationConfig;
use crate::parsing::positions::parse_positions_file;
use crate::parsing::stations::parse_stations_file;

#[derive(Args)]
pub struct AssociateArgs {
    /// Position file (CSV with Ref, Val, Package, PosX, PosY, Rot, Side)
    #[arg(long, required = true)]
    pub positions: PathBuf,

    /// Station catalog (CSV, or JSON when the extension is .json)
    #[arg(long, required = true)]
    pub stations: PathBuf,

    /// Path to an alias/ignore config (defaults to embedded)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a DPV program to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Discard station assignments from the position file before matching
    #[arg(long)]
    pub reset: bool,

    /// Which board side to list
    #[arg(long, value_enum, default_value = "all")]
    pub side: SideFilter,

    /// Only list parts left without a station
    #[arg(long)]
    pub unassigned_only: bool,
}

#[derive(Serialize)]
struct AssociateOutput<'a> {
    report: AssociationReport,
    parts: Vec<&'a ComponentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportSummary>,
}

/// Execute associate subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be parsed or the program cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AssociateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = AssociationConfig::load(args.config.as_deref())?;
    let parts = parse_positions_file(&args.positions)?;
    let stations = parse_stations_file(&args.stations)?;

    if verbose {
        eprintln!(
            "Loaded {} parts and {} stations",
            parts.len(),
            stations.len()
        );
    }

    if stations.is_empty() {
        eprintln!("Warning: Station catalog is empty, no parts can be matched.");
    }

    let mut engine = AssociationEngine::from_records(parts, stations, &config);
    if args.reset {
        engine.clear_assignments();
    }

    let report = engine.auto_associate_all();
    engine.set_filter(PartFilter {
        side: args.side,
        unassigned_only: args.unassigned_only,
    });

    let export = match &args.output {
        Some(path) => Some(write_program(&engine, path, &args.positions)?),
        None => None,
    };

    match format {
        OutputFormat::Text => print_text(&engine, &report, export.as_ref(), args.output.as_deref()),
        OutputFormat::Json => {
            let output = AssociateOutput {
                report,
                parts: engine.filtered_parts(),
                export,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print_tsv(&engine),
    }

    Ok(())
}

fn write_program(
    engine: &AssociationEngine,
    output: &Path,
    positions: &Path,
) -> anyhow::Result<ExportSummary> {
    let file_stem = |path: &Path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("board")
            .to_string()
    };

    let options = ExportOptions {
        file_name: output
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("export.dpv")
            .to_string(),
        pcb_file: file_stem(positions),
        ..ExportOptions::default()
    };

    let document = generate_now(engine.parts().iter(), engine.stations(), &options)?;
    std::fs::write(output, document.text)?;
    Ok(document.summary)
}

fn print_text(
    engine: &AssociationEngine,
    report: &AssociationReport,
    export: Option<&ExportSummary>,
    output: Option<&Path>,
) {
    let parts = engine.filtered_parts();

    println!(
        "Associated {} parts: {} matched, {} ignored, {} unmatched\n",
        engine.parts().len(),
        report.matched,
        report.ignored,
        report.unmatched
    );

    let ref_width = parts
        .iter()
        .map(|p| p.reference.len())
        .max()
        .unwrap_or(3)
        .max(3);
    let value_width = parts
        .iter()
        .map(|p| p.value.len().min(30))
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<ref_width$}  {:<value_width$}  {:<6}  {:<8}  Nozzle",
        "Ref", "Value", "Side", "Station"
    );
    println!("{}", "-".repeat(ref_width + value_width + 32));

    for part in &parts {
        let station = match engine.resolved_station(part) {
            Some(s) => s.id.to_string(),
            None if part.assignment.is_ignored() => "ignored".to_string(),
            None => "-".to_string(),
        };
        println!(
            "{:<ref_width$}  {:<value_width$}  {:<6}  {:<8}  {}",
            part.reference,
            truncate(&part.value, 30),
            part.side.to_string(),
            station,
            part.nozzle.as_deref().unwrap_or(""),
        );
    }

    if let (Some(summary), Some(path)) = (export, output) {
        println!(
            "\nWrote {} stations and {} components to {} ({} parts omitted)",
            summary.stations,
            summary.components,
            path.display(),
            summary.omitted
        );
    }
}

fn print_tsv(engine: &AssociationEngine) {
    println!("reference\tvalue\tside\tstation\tnozzle");
    for part in engine.filtered_parts() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            part.reference,
            part.value,
            part.side,
            part.assignment,
            part.nozzle.as_deref().unwrap_or(""),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
