//! Tab-separated table reading and writing
//!
//! Every report handled here is a TSV file with a header row. Tables are
//! loaded as raw string records and interpreted by the caller, either by
//! header name or by column position.

use crate::error::{ReportError, Result};
use csv::StringRecord;
use std::path::{Path, PathBuf};

/// Placeholder written for values that could not be joined
pub const MISSING: &str = "NA";

/// A loaded TSV file: its header and data rows, all of equal width
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl Table {
    /// Read a tab-separated file with a header row
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| ReportError::csv(&path, e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| ReportError::csv(&path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if header.is_empty() || header.iter().all(|h| h.is_empty()) {
            return Err(ReportError::schema(&path, "missing header row"));
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ReportError::csv(&path, e))?;
            if record.len() != header.len() {
                return Err(ReportError::schema(
                    &path,
                    format!(
                        "data row {} has {} columns, header has {}",
                        index + 1,
                        record.len(),
                        header.len()
                    ),
                ));
            }
            rows.push(record);
        }

        Ok(Self { path, header, rows })
    }

    /// Require the table to have exactly the given columns, ignoring their names
    pub fn expect_positional(&self, columns: &[&str]) -> Result<()> {
        if self.header.len() != columns.len() {
            return Err(ReportError::schema(
                &self.path,
                format!(
                    "expected {} columns ({}), found {}",
                    columns.len(),
                    columns.join(", "),
                    self.header.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Indices of all named columns, or `None` if any is absent
    pub fn resolve_columns(&self, names: &[&str]) -> Option<Vec<usize>> {
        names.iter().map(|name| self.column_index(name)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Write a header and rows as a tab-separated file
pub fn write_tsv<P, I>(path: P, header: &[&str], rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<String>>,
{
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;

    writer
        .write_record(header)
        .map_err(|e| ReportError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| ReportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;
    Ok(())
}

/// Empty, `NA` and NaN cells all count as missing
pub fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == MISSING || value.eq_ignore_ascii_case("nan")
}

pub fn parse_f64(path: &Path, column: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ReportError::Numeric {
            path: path.to_path_buf(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

pub fn parse_u64(path: &Path, column: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ReportError::Numeric {
            path: path.to_path_buf(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Parse a numeric cell where a missing value means absent
pub fn parse_optional_f64(path: &Path, column: &str, value: &str) -> Result<Option<f64>> {
    if is_missing(value) {
        return Ok(None);
    }
    parse_f64(path, column, value).map(Some)
}

/// Round half to even, matching how the upstream tables are rounded
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Fixed-decimal rendering for rounded values
pub fn format_rounded(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Shortest rendering of a pass-through float
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        format!("{value}")
    } else {
        format!("{value:e}")
    }
}

pub fn format_optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_table_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "a\tb\n1\t2\n3\t4\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(&table.rows[1][0], "3");
        assert_eq!(table.resolve_columns(&["b", "a"]), Some(vec![1, 0]));
        assert_eq!(table.resolve_columns(&["c"]), None);
    }

    #[test]
    fn test_ragged_row_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "a\tb\n1\t2\t3\n").unwrap();

        let err = Table::read(&path).unwrap_err();
        assert!(matches!(err, ReportError::Schema { .. }));
    }

    #[test]
    fn test_empty_file_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            Table::read(&path).unwrap_err(),
            ReportError::Schema { .. }
        ));
    }

    #[test]
    fn test_expect_positional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "x\ty\tz\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert!(table.is_empty());
        assert!(table.expect_positional(&["genome", "pc_coverage", "depth"]).is_ok());
        assert!(table.expect_positional(&["genome", "depth"]).is_err());
    }

    #[test]
    fn test_rounding_and_formatting() {
        assert_eq!(round_to(12.345678, 1), 12.3);
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(format_rounded(12.0, 1), "12.0");
        assert_eq!(format_rounded(3.1, 2), "3.10");
        assert_eq!(format_float(98.5), "98.5");
        assert_eq!(format_float(1e-50), "1e-50");
        assert_eq!(format_float(0.0), "0");
    }

    #[test]
    fn test_missing_values() {
        let path = Path::new("t.txt");
        assert!(is_missing("NA"));
        assert!(is_missing(""));
        assert!(is_missing("NaN"));
        assert!(is_missing(" nan "));
        assert!(!is_missing("0"));
        assert_eq!(parse_optional_f64(path, "RPKM", "NaN").unwrap(), None);
        assert_eq!(parse_optional_f64(path, "RPKM", "NA").unwrap(), None);
        assert_eq!(parse_optional_f64(path, "RPKM", "5.5").unwrap(), Some(5.5));
        assert!(parse_optional_f64(path, "RPKM", "abc").is_err());
        assert!(parse_u64(path, "read_count", "1.5").is_err());
    }

    #[test]
    fn test_write_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_tsv(&path, &["a", "b"], vec![vec!["1".to_string(), MISSING.to_string()]]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n1\tNA\n");
    }
}
