//! Error types shared by both summary stages

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed table {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("Non-numeric value {value:?} in column {column} of {path}")]
    Numeric {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error("Unknown orientation {value:?} in {path}")]
    Orientation { path: PathBuf, value: String },

    #[error("Threshold must be a finite, non-negative fraction, got {0}")]
    InvalidThreshold(f64),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
