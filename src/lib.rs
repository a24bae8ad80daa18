//! VirReport Summary Tools
//!
//! Summary tables for virus detection reports.
//!
//! This library provides shared functionality for:
//! - Joining top BLAST hits with CoverM coverage and mosdepth breadth
//! - Concatenating per-sample reports into a run-level summary
//! - Flagging likely cross-sample contamination per species
//! - Run-level JSON reporting

pub mod contamination;
pub mod coverage;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod records;
pub mod reporting;
pub mod tables;

pub use contamination::{ContaminationCall, ContaminationFlag, ContaminationFlagger};
pub use coverage::{CoverageJoiner, JoinOutcome};
pub use detection::{DetectionSummarizer, DetectionSummary, RunRecord};
pub use discovery::{DirectoryScan, FileDiscovery};
pub use error::ReportError;
pub use records::{BreadthPercentile, CoverageSummary, MergedRecord, Orientation, ReferenceHit};
pub use reporting::RunReport;
