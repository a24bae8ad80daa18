//! Record types read from and written to the per-sample reports

use crate::error::{ReportError, Result};
use crate::tables::{
    format_float, format_optional, format_rounded, parse_f64, parse_u64, round_to, Table,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Hit-table columns as named by the BLAST top-hit report
pub const HIT_TABLE_COLUMNS: [&str; 10] = [
    "species", "stitle", "qseqid", "sacc", "length", "pident", "sstrand", "evalue", "bitscore",
    "qcovs",
];

pub const COVERAGE_COLUMNS: [&str; 7] = [
    "genome",
    "read_count",
    "mean_cov",
    "variance",
    "RPKM",
    "%_bases_cov",
    "reference_length",
];

pub const BREADTH_COLUMNS: [&str; 3] = ["genome", "pc_coverage", "depth"];

/// Columns of the per-sample coverage-joined report
pub const SAMPLE_SUMMARY_COLUMNS: [&str; 18] = [
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
    "PCT_5X",
    "PCT_10X",
    "PCT_20X",
];

/// Strand of the subject sequence in a BLAST hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// Parse a BLAST `sstrand` label; only `plus` and `minus` are accepted
    pub fn parse(path: &Path, value: &str) -> Result<Self> {
        match value.trim() {
            "plus" => Ok(Orientation::Forward),
            "minus" => Ok(Orientation::Reverse),
            _ => Err(ReportError::Orientation {
                path: path.to_path_buf(),
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Forward => write!(f, "plus"),
            Orientation::Reverse => write!(f, "minus"),
        }
    }
}

/// One top-scoring BLAST hit of a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceHit {
    pub species: String,
    pub reference_title: String,
    pub query_id: String,
    pub reference_accession: String,
    pub query_length: u64,
    pub pc_ident: f64,
    pub orientation: Orientation,
    pub evalue: f64,
    pub bitscore: f64,
    pub query_coverage: f64,
}

impl ReferenceHit {
    /// Load all hits of a hit table.
    ///
    /// Columns are looked up by their BLAST names when the header carries
    /// all of them; otherwise the table must have exactly the ten hit
    /// columns in order.
    pub fn load(table: &Table) -> Result<Vec<Self>> {
        let indices = match table.resolve_columns(&HIT_TABLE_COLUMNS) {
            Some(indices) => indices,
            None => {
                table.expect_positional(&HIT_TABLE_COLUMNS)?;
                (0..HIT_TABLE_COLUMNS.len()).collect()
            }
        };

        let path = table.path.as_path();
        table
            .rows
            .iter()
            .map(|row| {
                let cell = |i: usize| row.get(indices[i]).unwrap_or("").trim();
                Ok(ReferenceHit {
                    species: cell(0).to_string(),
                    reference_title: cell(1).to_string(),
                    query_id: cell(2).to_string(),
                    reference_accession: cell(3).to_string(),
                    query_length: parse_u64(path, "length", cell(4))?,
                    pc_ident: parse_f64(path, "pident", cell(5))?,
                    orientation: Orientation::parse(path, cell(6))?,
                    evalue: parse_f64(path, "evalue", cell(7))?,
                    bitscore: parse_f64(path, "bitscore", cell(8))?,
                    query_coverage: parse_f64(path, "qcovs", cell(9))?,
                })
            })
            .collect()
    }
}

/// Read depth aggregate of one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub reference_accession: String,
    pub read_count: u64,
    pub mean_cov: f64,
    pub rpkm: f64,
    pub reference_length: u64,
}

/// Depths at which 5, 10 and 20 percent of a reference is covered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreadthPercentile {
    pub reference_accession: String,
    pub pct_5x: Option<f64>,
    pub pct_10x: Option<f64>,
    pub pct_20x: Option<f64>,
}

/// A hit joined with whatever coverage and breadth data matched it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub sample: String,
    pub hit: ReferenceHit,
    pub coverage: Option<CoverageSummary>,
    pub breadth: Option<BreadthPercentile>,
}

impl MergedRecord {
    /// Cells in `SAMPLE_SUMMARY_COLUMNS` order, `NA` for unmatched data
    pub fn to_row(&self) -> Vec<String> {
        let hit = &self.hit;
        let coverage = self.coverage.as_ref();
        let breadth = self.breadth.as_ref();
        let depth = |value: Option<f64>| format_optional(value.map(|d| format_rounded(d, 2)));

        vec![
            self.sample.clone(),
            hit.species.clone(),
            hit.reference_title.clone(),
            hit.reference_accession.clone(),
            format_optional(coverage.map(|c| c.reference_length.to_string())),
            hit.query_id.clone(),
            hit.query_length.to_string(),
            format_float(hit.pc_ident),
            hit.orientation.to_string(),
            format_float(hit.evalue),
            format_float(hit.bitscore),
            format_float(hit.query_coverage),
            format_optional(coverage.map(|c| c.read_count.to_string())),
            format_optional(coverage.map(|c| format_rounded(round_to(c.mean_cov, 1), 1))),
            format_optional(coverage.map(|c| format_rounded(round_to(c.rpkm, 1), 1))),
            depth(breadth.and_then(|b| b.pct_5x)),
            depth(breadth.and_then(|b| b.pct_10x)),
            depth(breadth.and_then(|b| b.pct_20x)),
        ]
    }
}
