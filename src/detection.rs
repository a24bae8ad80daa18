//! Run-level detection summary
//!
//! Concatenates the per-sample coverage-joined reports of a run, flags
//! likely cross-sample contamination per species and writes
//! `detection_summary_<YYYYMMDD-HHMMSS>.txt`.

use crate::contamination::{ContaminationFlag, ContaminationFlagger, SpeciesThreshold};
use crate::discovery::{FileDiscovery, SAMPLE_SUMMARY_SUFFIX};
use crate::error::{ReportError, Result};
use crate::reporting::RunReport;
use crate::tables::{is_missing, parse_optional_f64, write_tsv, Table, MISSING};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Columns of a run record, in the order they are kept in memory
pub const RUN_RECORD_COLUMNS: [&str; 19] = [
    "sample",
    "species",
    "reference_title",
    "reference_accession",
    "reference_length",
    "query_id",
    "query_length",
    "pc_ident",
    "orientation",
    "evalue",
    "bitscore",
    "query_coverage",
    "read_count",
    "mean_cov",
    "RPKM",
    "RPM",
    "PCT_5X",
    "PCT_10X",
    "PCT_20X",
];

pub const DETECTION_SUMMARY_COLUMNS: [&str; 19] = [
    "sample",
    "species",
    "reference_accession",
    "reference_length",
    "query_id",
    "query_length",
    "pc_ident",
    "orientation",
    "evalue",
    "bitscore",
    "query_coverage",
    "read_count",
    "mean_cov",
    "RPKM",
    "RPM",
    "PCT_5X",
    "PCT_10X",
    "PCT_20X",
    "contamination_flag",
];

/// Sole content of the summary of a run without any detection
pub const EMPTY_SUMMARY_HEADER: &str = "sample\tspecies\treference_title\treference_accession\treference_length\tquery_id\tquery_length\tpc_ident\torientation\tevalue\tbitscore\tquery_coverage\tread_count\tmean_cov\tRPKM\tRPM\tPCT_5X\tPCT_10X\tPCT_20X\tcontamination_flag";

const SAMPLE: usize = 0;
const SPECIES: usize = 1;
const REFERENCE_TITLE: usize = 2;
const RPKM: usize = 14;

/// One row of a per-sample report, read back for the run summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Cells in `RUN_RECORD_COLUMNS` order
    pub cells: Vec<String>,
    pub rpkm: Option<f64>,
}

impl RunRecord {
    pub fn sample(&self) -> &str {
        &self.cells[SAMPLE]
    }

    pub fn species(&self) -> &str {
        &self.cells[SPECIES]
    }

    /// Load a per-sample report; `RPM` is passed through when present
    pub fn load(table: &Table) -> Result<Vec<Self>> {
        let path = table.path.as_path();
        let mut indices = Vec::with_capacity(RUN_RECORD_COLUMNS.len());
        let mut absent = Vec::new();
        for name in RUN_RECORD_COLUMNS {
            let index = table.column_index(name);
            if index.is_none() && name != "RPM" {
                absent.push(name);
            }
            indices.push(index);
        }
        if !absent.is_empty() {
            return Err(ReportError::schema(
                path,
                format!("missing columns: {}", absent.join(", ")),
            ));
        }

        table
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = indices
                    .iter()
                    .map(|index| match index {
                        Some(i) => row.get(*i).unwrap_or("").to_string(),
                        None => MISSING.to_string(),
                    })
                    .collect();
                let rpkm = parse_optional_f64(path, RUN_RECORD_COLUMNS[RPKM], &cells[RPKM])?;
                Ok(RunRecord { cells, rpkm })
            })
            .collect()
    }
}

/// A run record with its contamination flag
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRow {
    pub record: RunRecord,
    pub flag: ContaminationFlag,
}

impl DetectionRow {
    /// Cells in `DETECTION_SUMMARY_COLUMNS` order, missing values as `0`
    pub fn to_row(&self) -> Vec<String> {
        let mut row: Vec<String> = self
            .record
            .cells
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != REFERENCE_TITLE)
            .map(|(_, cell)| {
                if is_missing(cell) {
                    "0".to_string()
                } else {
                    cell.clone()
                }
            })
            .collect();
        row.push(self.flag.call.to_string());
        row
    }
}

/// Flagged and sorted rows of a run plus the per-species thresholds
#[derive(Debug, Clone)]
pub struct DetectionSummary {
    pub rows: Vec<DetectionRow>,
    pub species: BTreeMap<String, SpeciesThreshold>,
}

/// Builds the run-level detection summary
pub struct DetectionSummarizer {
    pub flagger: ContaminationFlagger,
    pub output_dir: PathBuf,
}

impl DetectionSummarizer {
    pub fn new<P: AsRef<Path>>(threshold: f64, output_dir: P) -> Result<Self> {
        Ok(Self {
            flagger: ContaminationFlagger::new(threshold)?,
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    pub fn output_path(&self, timestamp: &str) -> PathBuf {
        self.output_dir
            .join(format!("detection_summary_{timestamp}.txt"))
    }

    /// Load every per-sample report found, in sorted path order
    pub fn load_run<D: FileDiscovery>(&self, discovery: &D) -> Result<Vec<RunRecord>> {
        let mut records = Vec::new();
        for path in discovery.find(SAMPLE_SUMMARY_SUFFIX)? {
            let loaded = RunRecord::load(&Table::read(&path)?)?;
            log::info!("Loaded {} records from {}", loaded.len(), path.display());
            records.extend(loaded);
        }
        Ok(records)
    }

    /// Flag every record against its species' run-wide maximum and sort
    /// by sample then species, keeping input order among ties
    pub fn summarize(&self, records: Vec<RunRecord>) -> DetectionSummary {
        let species = self
            .flagger
            .species_thresholds(records.iter().map(|r| (r.species(), r.rpkm)));

        let mut rows: Vec<DetectionRow> = records
            .into_iter()
            .map(|record| {
                let flag = self.flagger.flag(record.rpkm, &species[record.species()]);
                DetectionRow { record, flag }
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.record.sample(), a.record.species()).cmp(&(b.record.sample(), b.record.species()))
        });

        DetectionSummary { rows, species }
    }

    /// Summarize the run and write it, stamped with the current local time
    pub fn run<D: FileDiscovery>(&self, discovery: &D) -> Result<RunReport> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.run_at(discovery, &timestamp)
    }

    /// Summarize the run and write it under the given timestamp
    pub fn run_at<D: FileDiscovery>(&self, discovery: &D, timestamp: &str) -> Result<RunReport> {
        let records = self.load_run(discovery)?;
        let output = self.output_path(timestamp);

        if records.is_empty() {
            log::warn!("No detections in this run, writing header-only summary");
            std::fs::write(&output, EMPTY_SUMMARY_HEADER)
                .map_err(|e| ReportError::io(&output, e))?;
            return Ok(RunReport::empty(output, self.flagger.threshold));
        }

        let summary = self.summarize(records);
        write_tsv(
            &output,
            &DETECTION_SUMMARY_COLUMNS,
            summary.rows.iter().map(DetectionRow::to_row),
        )?;

        Ok(RunReport::from_summary(output, self.flagger.threshold, &summary))
    }
}
