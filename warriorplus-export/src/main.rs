//! warriorplus-export - WarriorPlus admin report exporter
//!
//! Fetches the platform's collections, builds a pharmaceutical, hospital,
//! comprehensive or raw report over a time window, and saves it as JSON or CSV.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use warriorplus_core::analytics::{usage_summary, UsageSummary};
use warriorplus_core::anonymize::Anonymization;
use warriorplus_core::export::{export_records, ExportArtifact, ExportFormat, ExportRequest};
use warriorplus_core::fetch::{fetch_all, FirestoreClient, RecordSource, SnapshotSource};
use warriorplus_core::report::ReportType;
use warriorplus_core::window::TimeWindow;
use warriorplus_core::Config;

#[derive(Parser, Debug)]
#[command(name = "warriorplus-export")]
#[command(about = "Export WarriorPlus analytics reports")]
#[command(version)]
struct Args {
    /// Report type (pharmaceutical, hospital, comprehensive, raw)
    #[arg(long)]
    report: Option<String>,

    /// Time window (all, 7d, 30d, 90d, 1y, or YYYY-MM-DD..YYYY-MM-DD)
    #[arg(long)]
    window: Option<String>,

    /// Output format (json, csv)
    #[arg(long)]
    format: Option<String>,

    /// Anonymization level (none, partial, full)
    #[arg(long)]
    anonymization: Option<String>,

    /// Read records from a JSON snapshot instead of Firestore
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Directory to write the export to (default: from config)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the export to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Print a medication usage summary
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let log_guard = warriorplus_core::logging::init(&config.logging).ok();

    let result = run(&args, &config);
    if log_guard.is_some() {
        return result.with_context(|| {
            format!(
                "export failed (log: {})",
                warriorplus_core::logging::log_file_path().display()
            )
        });
    }
    result
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let report_type =
        ReportType::from_selector(args.report.as_deref().unwrap_or(&config.export.report_type));
    let window: TimeWindow = args
        .window
        .as_deref()
        .unwrap_or(&config.export.window)
        .parse()
        .context("invalid --window")?;
    let format: ExportFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.export.format)
        .parse()
        .context("invalid --format")?;
    let anonymization: Anonymization = args
        .anonymization
        .as_deref()
        .unwrap_or(&config.export.anonymization)
        .parse()
        .context("invalid --anonymization")?;

    let request = ExportRequest {
        report_type,
        window,
        format,
        anonymization,
    };

    let source: Box<dyn RecordSource> = match &args.snapshot {
        Some(path) => Box::new(SnapshotSource::open(path).context("failed to open snapshot")?),
        None => {
            if !config.store.is_ready() {
                anyhow::bail!(
                    "No Firestore project configured. Set [store] project_id in {} or pass --snapshot FILE",
                    Config::config_path().display()
                );
            }
            Box::new(
                FirestoreClient::new(config.store.clone())
                    .context("failed to create Firestore client")?,
            )
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    pb.set_message("Fetching records...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let fetched = runtime.block_on(fetch_all(source.as_ref()));
    pb.finish_and_clear();
    let records = fetched.context("failed to fetch records")?;

    let now = chrono::Utc::now();

    if args.summary {
        let summary = usage_summary(&records.global_medications);
        // keep stdout clean for the export itself
        if args.stdout {
            print_summary(&mut std::io::stderr(), &summary)?;
        } else {
            print_summary(&mut std::io::stdout(), &summary)?;
        }
    }

    let artifact = export_records(records, &request, &config.thresholds, now)
        .context("failed to build export")?;

    if args.stdout {
        println!("{}", artifact.content);
    } else {
        let output_dir = args
            .output
            .clone()
            .unwrap_or_else(|| config.export.output_dir());
        let path = write_artifact(&output_dir, &artifact)?;
        println!("Exported {} report ({}) to {}", report_type, window.display_name(), path.display());
    }

    tracing::info!(
        report_type = %report_type,
        window = %window,
        format = %format,
        anonymization = %anonymization,
        "warriorplus-export complete"
    );

    Ok(())
}

fn write_artifact(output_dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("failed to create output directory: {}", output_dir.display())
    })?;

    let path = output_dir.join(&artifact.filename);
    std::fs::write(&path, &artifact.content)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    Ok(path)
}

fn print_summary(out: &mut dyn Write, summary: &UsageSummary) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "MEDICATION USAGE")?;
    writeln!(
        out,
        "   Patients: {:<10} Medications tracked: {}",
        summary.total_patients, summary.medications_tracked
    )?;

    if summary.medications_tracked == 0 {
        writeln!(out, "   No medication data found.")?;
        writeln!(out)?;
        return Ok(());
    }

    if let Some(most) = &summary.most_prescribed {
        let share = most
            .share_of_total
            .map(|s| format!(" ({:.1}%)", s))
            .unwrap_or_default();
        writeln!(
            out,
            "   Most prescribed: {} - {} patients{}",
            most.name, most.patient_count, share
        )?;
    }
    if let Some(best) = &summary.most_effective {
        writeln!(
            out,
            "   Most effective:  {} - {:.1} avg efficacy",
            best.name, best.avg_efficacy
        )?;
    }

    writeln!(out)?;
    writeln!(out, "TOP MEDICATIONS")?;
    for (i, med) in summary.top_by_patients.iter().enumerate() {
        writeln!(
            out,
            "   {}. {:<24} {:>6} patients  {:>4.1} efficacy  {:>5.1}% side effects",
            i + 1,
            med.name,
            med.patient_count,
            med.avg_efficacy,
            med.side_effect_percentage
        )?;
    }
    writeln!(out)?;
    Ok(())
}
