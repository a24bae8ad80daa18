//! Report file discovery and accession-to-file matching
//!
//! Upstream reports are found by a fixed file name suffix inside a working
//! directory. Per-reference fragments (coverage, breadth) carry the
//! reference accession somewhere in their file name.

use crate::error::{ReportError, Result};
use std::path::{Path, PathBuf};

pub const HIT_TABLE_SUFFIX: &str = "_blastn_top_viral_spp_hits.txt";
pub const COVERAGE_SUFFIX: &str = "_coverm_summary.txt";
pub const BREADTH_SUFFIX: &str = "mosdepth.global.dist.txt";
pub const SAMPLE_SUMMARY_SUFFIX: &str = "_top_blast_with_cov_stats.txt";

/// Source of candidate report files
pub trait FileDiscovery {
    /// All files whose name ends with `suffix`, sorted by path
    fn find(&self, suffix: &str) -> Result<Vec<PathBuf>>;
}

/// Scans a single directory (non-recursive)
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    pub dir: PathBuf,
}

impl DirectoryScan {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileDiscovery for DirectoryScan {
    fn find(&self, suffix: &str) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| ReportError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ReportError::io(&self.dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            if file_name(&path).ends_with(suffix) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// True when `needle` occurs in `haystack` as a whole token.
///
/// A token occurrence is not preceded by an alphanumeric character and is
/// not followed by an alphanumeric character or by a `.` plus digit, so
/// `NC_0012` does not match `NC_00123` and `MN908947` does not match
/// `MN908947.3`.
pub fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let clean_start = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let clean_end = match bytes.get(end) {
            None => true,
            Some(b'.') => !bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()),
            Some(b) => !b.is_ascii_alphanumeric(),
        };
        clean_start && clean_end
    })
}

/// Outcome of matching one accession against a set of fragment files
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMatch {
    pub selected: PathBuf,
    pub ignored: Vec<PathBuf>,
}

/// Pick the fragment file belonging to `accession`.
///
/// Files whose name contains the accession as a token are preferred over
/// plain substring matches. Within the preferred group the first path in
/// sorted order is selected; the rest are reported as ignored.
pub fn match_fragment(accession: &str, files: &[PathBuf]) -> Option<FragmentMatch> {
    if accession.is_empty() {
        return None;
    }

    let substring: Vec<&PathBuf> = files
        .iter()
        .filter(|path| file_name(path).contains(accession))
        .collect();
    let token: Vec<&PathBuf> = substring
        .iter()
        .copied()
        .filter(|path| contains_token(&file_name(path), accession))
        .collect();

    let mut candidates = if token.is_empty() { substring } else { token };
    candidates.sort();

    let (first, rest) = candidates.split_first()?;
    Some(FragmentMatch {
        selected: (*first).clone(),
        ignored: rest.iter().map(|p| (*p).clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directory_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "S2_blastn_top_viral_spp_hits.txt",
            "S1_blastn_top_viral_spp_hits.txt",
            "S1_coverm_summary.txt",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "x\n").unwrap();
        }
        fs::create_dir(dir.path().join("sub_blastn_top_viral_spp_hits.txt")).unwrap();

        let found = DirectoryScan::new(dir.path()).find(HIT_TABLE_SUFFIX).unwrap();
        let names: Vec<String> = found.iter().map(|p| file_name(p)).collect();
        assert_eq!(
            names,
            vec![
                "S1_blastn_top_viral_spp_hits.txt",
                "S2_blastn_top_viral_spp_hits.txt"
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let scan = DirectoryScan::new("/nonexistent/virreport/dir");
        assert!(matches!(scan.find(COVERAGE_SUFFIX), Err(ReportError::Io { .. })));
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("S1_NC_001477_coverm_summary.txt", "NC_001477"));
        assert!(contains_token("S1_MN908947.mosdepth.global.dist.txt", "MN908947"));
        assert!(!contains_token("S1_NC_0014770_coverm_summary.txt", "NC_001477"));
        assert!(!contains_token("S1_MN908947.3_coverm_summary.txt", "MN908947"));
        assert!(contains_token("MN908947.3_coverm_summary.txt", "MN908947.3"));
        assert!(!contains_token("abc", ""));
    }

    #[test]
    fn test_match_fragment_prefers_token_match() {
        let files = vec![
            PathBuf::from("S1_AB1234_coverm_summary.txt"),
            PathBuf::from("S1_AB123_coverm_summary.txt"),
        ];
        let found = match_fragment("AB123", &files).unwrap();
        assert_eq!(found.selected, PathBuf::from("S1_AB123_coverm_summary.txt"));
        assert!(found.ignored.is_empty());
    }

    #[test]
    fn test_match_fragment_substring_fallback() {
        let files = vec![PathBuf::from("S1_xAB123y_coverm_summary.txt")];
        let found = match_fragment("AB123", &files).unwrap();
        assert_eq!(found.selected, files[0]);
    }

    #[test]
    fn test_match_fragment_tie_break_is_sorted_first() {
        let files = vec![
            PathBuf::from("S1_run2_AB123_coverm_summary.txt"),
            PathBuf::from("S1_run1_AB123_coverm_summary.txt"),
        ];
        let found = match_fragment("AB123", &files).unwrap();
        assert_eq!(found.selected, PathBuf::from("S1_run1_AB123_coverm_summary.txt"));
        assert_eq!(found.ignored, vec![PathBuf::from("S1_run2_AB123_coverm_summary.txt")]);
    }

    #[test]
    fn test_match_fragment_none() {
        let files = vec![PathBuf::from("S1_XY999_coverm_summary.txt")];
        assert!(match_fragment("AB123", &files).is_none());
        assert!(match_fragment("", &files).is_none());
    }
}
