//! VirReport Coverage Join Tool
//!
//! Joins a sample's top BLAST hits with per-reference coverage statistics

use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use virreport_summary_tools::{CoverageJoiner, DirectoryScan};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("virreport-coverage-join")
        .version("0.1.0")
        .about("Join top BLAST hits with CoverM and mosdepth statistics for one sample")
        .author("Megan Johnson")
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .value_name("NAME")
                .help("Sample name")
                .required(true),
        )
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .value_name("DIRECTORY")
                .help("Directory holding the sample's report files")
                .default_value("."),
        )
        .get_matches();

    let sample = matches
        .get_one::<String>("sample")
        .context("--sample is required")?;
    let dir = PathBuf::from(
        matches
            .get_one::<String>("dir")
            .context("--dir has a default")?,
    );

    println!("🧬 VirReport Coverage Join Tool");
    println!("Sample: {}", sample);
    println!("Directory: {}", dir.display());

    if !dir.is_dir() {
        anyhow::bail!("Directory does not exist: {}", dir.display());
    }

    let joiner = CoverageJoiner::new(sample, &dir);
    let discovery = DirectoryScan::new(&dir);

    println!("🔗 Joining hits with coverage statistics...");
    let outcome = joiner
        .run(&discovery)
        .with_context(|| format!("Coverage join failed for sample {}", sample))?;

    match outcome {
        Some(outcome) => {
            println!("✅ Coverage join complete!");
            println!("📊 Records: {}", outcome.records);
            println!("  With coverage: {}", outcome.with_coverage);
            println!("  With breadth: {}", outcome.with_breadth);
            println!("💾 Results saved to: {}", outcome.output.display());
        }
        None => {
            println!("⚠️ No BLAST hit tables found, nothing written");
        }
    }

    Ok(())
}
