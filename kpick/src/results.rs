/// Per-file results and the aggregation that turns them into a report.
///
/// Each scan task owns exactly one [`FileScanResult`] until it hands it to the
/// fan-in channel. From then on the [`ResultAggregator`] is the only owner: it
/// counts errors, drops clean files, and buffers the files with matches. The
/// report order is fixed by [`ResultAggregator::finish`], which sorts the
/// retained files by path, so the output never depends on which task finished
/// first.
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::{ScanError, SearchResult};

/// Outcome of scanning one file
#[derive(Debug, Serialize)]
pub struct FileScanResult {
    /// The path as it was discovered
    pub path: PathBuf,
    /// 1-based line number to line text, iterated in line order
    pub matched_lines: BTreeMap<usize, String>,
    /// Set iff opening or reading the file failed
    #[serde(skip)]
    pub scan_error: Option<ScanError>,
}

impl FileScanResult {
    /// Creates an empty result for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            matched_lines: BTreeMap::new(),
            scan_error: None,
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.matched_lines.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.scan_error.is_some()
    }
}

/// A file that could not be scanned, kept for error-only output
#[derive(Debug, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// Counts reported at the end of every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Total number of files handed to the engine
    pub files_scanned: usize,
    /// Files whose scan failed
    pub errors: usize,
    /// Files with at least one matched line
    pub files_with_matches: usize,
}

impl RunSummary {
    /// Files that were read to the end without error
    pub fn successes(&self) -> usize {
        self.files_scanned - self.errors
    }
}

/// The final, path-ordered report of a run
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    /// Files with matches in ascending path order
    pub files: Vec<FileScanResult>,
    /// Files that failed, in ascending path order
    pub errors: Vec<FileError>,
    pub summary: RunSummary,
}

impl ScanReport {
    /// An empty report, used when no candidate files were found
    pub fn new() -> Self {
        Default::default()
    }

    /// Total matched lines across all reported files
    pub fn total_matched_lines(&self) -> usize {
        self.files.iter().map(|f| f.matched_lines.len()).sum()
    }

    pub fn to_json(&self) -> SearchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Classifies results as they arrive and produces the ordered report.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    retained: Vec<FileScanResult>,
    errors: Vec<FileError>,
    files_scanned: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Takes ownership of one result.
    ///
    /// Errors are counted and kept by path, files with matches are buffered,
    /// clean files are dropped.
    pub fn add(&mut self, result: FileScanResult) {
        self.files_scanned += 1;
        if let Some(err) = result.scan_error {
            self.errors.push(FileError {
                path: result.path,
                message: err.to_string(),
            });
        } else if result.has_matches() {
            self.retained.push(result);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Sorts everything by path and builds the report.
    pub fn finish(mut self) -> ScanReport {
        // Plain string order, not per-component `Path` order
        self.retained
            .sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        self.errors
            .sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));

        let summary = RunSummary {
            files_scanned: self.files_scanned,
            errors: self.errors.len(),
            files_with_matches: self.retained.len(),
        };

        ScanReport {
            files: self.retained,
            errors: self.errors,
            summary,
        }
    }
}

impl Extend<FileScanResult> for ResultAggregator {
    fn extend<I: IntoIterator<Item = FileScanResult>>(&mut self, iter: I) {
        for result in iter {
            self.add(result);
        }
    }
}
