use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::matching::resolver::{AssociationConfig, MarkingReport, MarkingResolver};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Markings to classify (e.g. 4.7k 100n DMG2302)
    #[arg(required = true)]
    pub markings: Vec<String>,

    /// Path to an alias/ignore config (defaults to embedded)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute classify subcommand
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or output fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClassifyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = AssociationConfig::load(args.config.as_deref())?;
    if verbose {
        eprintln!(
            "Loaded config with {} alias groups and {} ignored markings",
            config.aliases.len(),
            config.ignore.len()
        );
    }

    let resolver = MarkingResolver::new(&config);
    let reports: Vec<MarkingReport> = args.markings.iter().map(|m| resolver.describe(m)).collect();

    match format {
        OutputFormat::Text => print_text(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Tsv => print_tsv(&reports),
    }

    Ok(())
}

/// Value or name column for one report
fn describe_value(report: &MarkingReport) -> String {
    match &report.classification {
        Some(info) => match (info.numeric_value, &info.raw_name) {
            (Some(value), _) => value.to_string(),
            (None, Some(name)) => name.clone(),
            (None, None) => String::new(),
        },
        None => String::new(),
    }
}

fn describe_kind(report: &MarkingReport) -> String {
    if report.ignored {
        "ignored".to_string()
    } else {
        report
            .classification
            .as_ref()
            .map_or_else(String::new, |c| c.kind.to_string())
    }
}

fn print_text(reports: &[MarkingReport]) {
    let width = reports
        .iter()
        .map(|r| r.marking.len())
        .max()
        .unwrap_or(7)
        .max(7);

    println!("{:<width$}  {:<10}  {:<15}  Value", "Marking", "Kind", "Resolved");
    println!("{}", "-".repeat(width + 40));
    for report in reports {
        println!(
            "{:<width$}  {:<10}  {:<15}  {}",
            report.marking,
            describe_kind(report),
            report.resolved.as_deref().unwrap_or("-"),
            describe_value(report),
        );
    }
}

fn print_tsv(reports: &[MarkingReport]) {
    println!("marking\tkind\tresolved\tvalue");
    for report in reports {
        println!(
            "{}\t{}\t{}\t{}",
            report.marking,
            describe_kind(report),
            report.resolved.as_deref().unwrap_or(""),
            describe_value(report),
        );
    }
}
