//! Run-level reporting module
//!
//! Aggregates contamination calls across all samples of a run

use crate::contamination::{ContaminationCall, SpeciesThreshold};
use crate::detection::DetectionSummary;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub threshold: f64,
    pub records: usize,
    pub samples: usize,
    pub flagged_records: usize,
    pub clear_records: usize,
    pub unassessed_records: usize,
    pub species: Vec<SpeciesThreshold>,
}

impl RunReport {
    /// Report for a run without any detection
    pub fn empty(output: PathBuf, threshold: f64) -> Self {
        Self {
            output,
            threshold,
            records: 0,
            samples: 0,
            flagged_records: 0,
            clear_records: 0,
            unassessed_records: 0,
            species: Vec::new(),
        }
    }

    pub fn from_summary(output: PathBuf, threshold: f64, summary: &DetectionSummary) -> Self {
        let count = |call: ContaminationCall| {
            summary
                .rows
                .iter()
                .filter(|row| row.flag.call == call)
                .count()
        };
        let samples: BTreeSet<&str> = summary.rows.iter().map(|r| r.record.sample()).collect();

        Self {
            output,
            threshold,
            records: summary.rows.len(),
            samples: samples.len(),
            flagged_records: count(ContaminationCall::Flagged),
            clear_records: count(ContaminationCall::Clear),
            unassessed_records: count(ContaminationCall::NotAssessed),
            species: summary.species.values().cloned().collect(),
        }
    }

    /// Export report to JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contamination::{ContaminationFlag, ContaminationFlagger};
    use crate::detection::{DetectionRow, RunRecord};

    fn row(sample: &str, species: &str, call: ContaminationCall) -> DetectionRow {
        let mut cells = vec!["NA".to_string(); 19];
        cells[0] = sample.to_string();
        cells[1] = species.to_string();
        DetectionRow {
            record: RunRecord { cells, rpkm: None },
            flag: ContaminationFlag {
                rpkm_max: None,
                threshold_value: None,
                call,
            },
        }
    }

    #[test]
    fn test_report_counts() {
        let flagger = ContaminationFlagger::default();
        let summary = DetectionSummary {
            rows: vec![
                row("S1", "PVY", ContaminationCall::Flagged),
                row("S1", "ToMV", ContaminationCall::NotAssessed),
                row("S2", "PVY", ContaminationCall::Clear),
            ],
            species: flagger.species_thresholds(vec![("PVY", Some(100.0)), ("ToMV", Some(8.0))]),
        };

        let report = RunReport::from_summary(PathBuf::from("out.txt"), 0.1, &summary);
        assert_eq!(report.records, 3);
        assert_eq!(report.samples, 2);
        assert_eq!(report.flagged_records, 1);
        assert_eq!(report.clear_records, 1);
        assert_eq!(report.unassessed_records, 1);
        assert_eq!(report.species.len(), 2);
        assert_eq!(report.species[0].species, "PVY");
        assert_eq!(report.species[0].threshold_value, Some(10.0));
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = RunReport::empty(PathBuf::from("detection_summary_x.txt"), 0.1);
        report.export_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["records"], 0);
        assert_eq!(value["threshold"], 0.1);
        assert_eq!(value["output"], "detection_summary_x.txt");
    }
}
