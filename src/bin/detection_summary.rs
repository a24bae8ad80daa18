//! VirReport Detection Summary Tool
//!
//! Run-level detection summary with cross-sample contamination flags

use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use virreport_summary_tools::{DetectionSummarizer, DirectoryScan};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("virreport-detection-summary")
        .version("0.1.0")
        .about("Summarize detections across a run and flag likely contamination")
        .author("Megan Johnson")
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("threshold")
                .value_name("FRACTION")
                .help("Fraction of the species' maximum RPKM below which a detection is flagged")
                .default_value("0.1"),
        )
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .value_name("DIRECTORY")
                .help("Directory holding the per-sample coverage reports")
                .default_value("."),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("JSON")
                .help("Optional JSON file for the run report"),
        )
        .get_matches();

    let threshold: f64 = matches
        .get_one::<String>("threshold")
        .context("--threshold has a default")?
        .parse()
        .context("--threshold must be a number")?;
    let dir = PathBuf::from(
        matches
            .get_one::<String>("dir")
            .context("--dir has a default")?,
    );
    let report_file = matches.get_one::<String>("report").map(PathBuf::from);

    println!("📊 VirReport Detection Summary Tool");
    println!("Directory: {}", dir.display());
    println!("Threshold: {}", threshold);

    if !dir.is_dir() {
        anyhow::bail!("Directory does not exist: {}", dir.display());
    }

    let summarizer = DetectionSummarizer::new(threshold, &dir)?;
    let discovery = DirectoryScan::new(&dir);

    println!("🦠 Flagging cross-sample contamination...");
    let report = summarizer.run(&discovery).context("Detection summary failed")?;

    if let Some(path) = &report_file {
        report.export_json(path)?;
    }

    println!("✅ Detection summary complete!");
    println!("📈 Summary Statistics:");
    println!("  Samples: {}", report.samples);
    println!("  Records: {}", report.records);
    println!("  Flagged: {}", report.flagged_records);
    println!("  Clear: {}", report.clear_records);
    println!("  Not assessed: {}", report.unassessed_records);
    println!("💾 Summary saved to: {}", report.output.display());
    if let Some(path) = &report_file {
        println!("💾 Run report saved to: {}", path.display());
    }

    Ok(())
}
