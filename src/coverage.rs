//! Per-sample coverage join
//!
//! Joins the top BLAST hits of one sample with the CoverM coverage summary
//! and mosdepth breadth distribution of each hit reference:
//! - hits come from `*_blastn_top_viral_spp_hits.txt`
//! - coverage fragments from `*_coverm_summary.txt`
//! - breadth fragments from `*mosdepth.global.dist.txt`
//!
//! Fragments are linked to a hit through the reference accession embedded
//! in their file name. Hits without fragments keep their row with `NA`.

use crate::discovery::{
    match_fragment, FileDiscovery, BREADTH_SUFFIX, COVERAGE_SUFFIX, HIT_TABLE_SUFFIX,
    SAMPLE_SUMMARY_SUFFIX,
};
use crate::error::Result;
use crate::records::{
    BreadthPercentile, CoverageSummary, MergedRecord, ReferenceHit, BREADTH_COLUMNS,
    COVERAGE_COLUMNS, SAMPLE_SUMMARY_COLUMNS,
};
use crate::tables::{parse_f64, parse_u64, round_to, write_tsv, Table};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Breadth levels (percent of reference covered) reported per hit
pub const BREADTH_LEVELS: [f64; 3] = [5.0, 10.0, 20.0];

/// Summary of one joiner invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub output: PathBuf,
    pub records: usize,
    pub with_coverage: usize,
    pub with_breadth: usize,
}

/// Builds the coverage-joined report of one sample
pub struct CoverageJoiner {
    pub sample: String,
    pub output_dir: PathBuf,
}

impl CoverageJoiner {
    pub fn new<P: AsRef<Path>>(sample: &str, output_dir: P) -> Self {
        Self {
            sample: sample.to_string(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", self.sample, SAMPLE_SUMMARY_SUFFIX))
    }

    /// Join hits with their fragments.
    ///
    /// Returns `None` when there is no hit table at all.
    pub fn join<D: FileDiscovery>(&self, discovery: &D) -> Result<Option<Vec<MergedRecord>>> {
        let hit_files = discovery.find(HIT_TABLE_SUFFIX)?;
        if hit_files.is_empty() {
            return Ok(None);
        }

        let mut hits = Vec::new();
        for path in &hit_files {
            let table = Table::read(path)?;
            let loaded = ReferenceHit::load(&table)?;
            log::info!("Loaded {} hits from {}", loaded.len(), path.display());
            hits.extend(loaded);
        }

        let coverage_files = discovery.find(COVERAGE_SUFFIX)?;
        let breadth_files = discovery.find(BREADTH_SUFFIX)?;

        let mut coverage: HashMap<String, CoverageSummary> = HashMap::new();
        let mut breadth: HashMap<String, BreadthPercentile> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for hit in &hits {
            let accession = hit.reference_accession.as_str();
            if !seen.insert(accession) {
                continue;
            }

            if let Some(path) = select_fragment(accession, &coverage_files) {
                if let Some(summary) = load_coverage(&path, accession)? {
                    coverage.insert(accession.to_string(), summary);
                }
            }
            if let Some(path) = select_fragment(accession, &breadth_files) {
                breadth.insert(accession.to_string(), load_breadth(&path, accession)?);
            }
        }

        let records = hits
            .into_iter()
            .map(|hit| MergedRecord {
                sample: self.sample.clone(),
                coverage: coverage.get(&hit.reference_accession).cloned(),
                breadth: breadth.get(&hit.reference_accession).cloned(),
                hit,
            })
            .collect();

        Ok(Some(records))
    }

    /// Join and write `<sample>_top_blast_with_cov_stats.txt`
    pub fn run<D: FileDiscovery>(&self, discovery: &D) -> Result<Option<JoinOutcome>> {
        let Some(records) = self.join(discovery)? else {
            log::warn!("No {} files found, nothing written", HIT_TABLE_SUFFIX);
            return Ok(None);
        };

        let output = self.output_path();
        write_tsv(
            &output,
            &SAMPLE_SUMMARY_COLUMNS,
            records.iter().map(MergedRecord::to_row),
        )?;

        Ok(Some(JoinOutcome {
            output,
            records: records.len(),
            with_coverage: records.iter().filter(|r| r.coverage.is_some()).count(),
            with_breadth: records.iter().filter(|r| r.breadth.is_some()).count(),
        }))
    }
}

fn select_fragment(accession: &str, files: &[PathBuf]) -> Option<PathBuf> {
    let found = match_fragment(accession, files)?;
    if !found.ignored.is_empty() {
        log::warn!(
            "{} files match accession {}; using {} and ignoring {:?}",
            found.ignored.len() + 1,
            accession,
            found.selected.display(),
            found.ignored
        );
    }
    Some(found.selected)
}

/// Read the CoverM summary row for `accession`.
///
/// The row whose genome label contains the accession is preferred; a
/// single-genome summary falls back to its first row.
pub fn load_coverage(path: &Path, accession: &str) -> Result<Option<CoverageSummary>> {
    let table = Table::read(path)?;
    table.expect_positional(&COVERAGE_COLUMNS)?;

    let labelled: Vec<_> = table
        .rows
        .iter()
        .filter(|row| row.get(0).is_some_and(|genome| genome.contains(accession)))
        .collect();
    if labelled.len() > 1 {
        log::warn!(
            "{} rows of {} match accession {}; using the first",
            labelled.len(),
            path.display(),
            accession
        );
    }

    let Some(row) = labelled.first().copied().or_else(|| table.rows.first()) else {
        return Ok(None);
    };
    let cell = |i: usize| row.get(i).unwrap_or("");

    Ok(Some(CoverageSummary {
        reference_accession: accession.to_string(),
        read_count: parse_u64(path, COVERAGE_COLUMNS[1], cell(1))?,
        mean_cov: round_to(parse_f64(path, COVERAGE_COLUMNS[2], cell(2))?, 1),
        rpkm: round_to(parse_f64(path, COVERAGE_COLUMNS[4], cell(4))?, 1),
        reference_length: parse_u64(path, COVERAGE_COLUMNS[6], cell(6))?,
    }))
}

/// Read the depths at 5, 10 and 20 percent breadth for `accession`
pub fn load_breadth(path: &Path, accession: &str) -> Result<BreadthPercentile> {
    let table = Table::read(path)?;
    table.expect_positional(&BREADTH_COLUMNS)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let genome = row.get(0).unwrap_or("");
        let pc_coverage = parse_f64(path, BREADTH_COLUMNS[1], row.get(1).unwrap_or(""))?;
        let depth = parse_f64(path, BREADTH_COLUMNS[2], row.get(2).unwrap_or(""))?;
        rows.push((genome, pc_coverage, depth));
    }

    let depth_at = |level: f64| {
        let mut matching = rows
            .iter()
            .filter(|(genome, pc, _)| *pc == level && genome.contains(accession));
        let first = matching.next().map(|(_, _, depth)| round_to(*depth, 2));
        let extra = matching.count();
        if extra > 0 {
            log::warn!(
                "{} has {} extra rows at {}% breadth for {}; using the first",
                path.display(),
                extra,
                level,
                accession
            );
        }
        first
    };

    Ok(BreadthPercentile {
        reference_accession: accession.to_string(),
        pct_5x: depth_at(BREADTH_LEVELS[0]),
        pct_10x: depth_at(BREADTH_LEVELS[1]),
        pct_20x: depth_at(BREADTH_LEVELS[2]),
    })
}
