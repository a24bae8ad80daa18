//! Cross-sample contamination flagging
//!
//! A detection is suspicious when its RPKM is small next to the strongest
//! detection of the same species anywhere in the run. Species whose run-wide
//! maximum stays at or below the minimum signal are not assessed; species
//! without any numeric RPKM have no maximum and are never flagged.

use crate::error::{ReportError, Result};
use crate::tables::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of the contamination heuristic for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContaminationCall {
    Flagged,
    Clear,
    NotAssessed,
}

impl fmt::Display for ContaminationCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContaminationCall::Flagged => write!(f, "True"),
            ContaminationCall::Clear => write!(f, "False"),
            ContaminationCall::NotAssessed => write!(f, "NA"),
        }
    }
}

/// Run-wide abundance reference of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesThreshold {
    pub species: String,
    pub rpkm_max: Option<f64>,
    pub threshold_value: Option<f64>,
}

/// Derived flag attributes of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminationFlag {
    pub rpkm_max: Option<f64>,
    pub threshold_value: Option<f64>,
    pub call: ContaminationCall,
}

/// Contamination flagger configuration
#[derive(Debug, Clone)]
pub struct ContaminationFlagger {
    /// Fraction of the species maximum below which a detection is flagged
    pub threshold: f64,
    /// Species maxima at or below this RPKM are not assessed
    pub min_signal: f64,
}

impl Default for ContaminationFlagger {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            min_signal: 10.0,
        }
    }
}

impl ContaminationFlagger {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ReportError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            ..Self::default()
        })
    }

    /// Maximum RPKM and threshold value per species, over all records given
    pub fn species_thresholds<'a, I>(&self, records: I) -> BTreeMap<String, SpeciesThreshold>
    where
        I: IntoIterator<Item = (&'a str, Option<f64>)>,
    {
        let mut maxima: BTreeMap<String, Option<f64>> = BTreeMap::new();
        for (species, rpkm) in records {
            let entry = maxima.entry(species.to_string()).or_insert(None);
            if let Some(value) = rpkm {
                *entry = Some(entry.map_or(value, |current| current.max(value)));
            }
        }

        maxima
            .into_iter()
            .map(|(species, max)| {
                let rpkm_max = max.map(|m| round_to(m, 1));
                let threshold_value = rpkm_max.map(|m| round_to(m * self.threshold, 1));
                let threshold = SpeciesThreshold {
                    species: species.clone(),
                    rpkm_max,
                    threshold_value,
                };
                (species, threshold)
            })
            .collect()
    }

    /// Flag one record against its species threshold
    pub fn flag(&self, rpkm: Option<f64>, species: &SpeciesThreshold) -> ContaminationFlag {
        let call = match (species.rpkm_max, species.threshold_value, rpkm) {
            (Some(max), _, _) if max <= self.min_signal => ContaminationCall::NotAssessed,
            (_, Some(threshold), Some(value)) if value < threshold => ContaminationCall::Flagged,
            _ => ContaminationCall::Clear,
        };

        ContaminationFlag {
            rpkm_max: species.rpkm_max,
            threshold_value: species.threshold_value,
            call,
        }
    }
}
