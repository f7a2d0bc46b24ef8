use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{trace, warn};

use super::engine::CancelFlag;
use super::matcher::{LineVerdict, ScanTarget};
use crate::errors::ScanError;
use crate::metrics::{OpenFileGuard, ScanMetrics};
use crate::results::FileScanResult;

const BUFFER_CAPACITY: usize = 64 * 1024;
const LINE_CAPACITY: usize = 256;

/// Strips a trailing `\n` or `\r\n`
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Scans single files against a shared [`ScanTarget`]
#[derive(Debug, Clone, Copy)]
pub struct FileProcessor<'a> {
    target: &'a ScanTarget,
    metrics: &'a ScanMetrics,
    cancel: &'a CancelFlag,
}

impl<'a> FileProcessor<'a> {
    pub fn new(target: &'a ScanTarget, metrics: &'a ScanMetrics, cancel: &'a CancelFlag) -> Self {
        Self {
            target,
            metrics,
            cancel,
        }
    }

    /// Reads `path` line by line and records every matched line.
    ///
    /// Never fails: open errors, read errors and cancellation are stored on the
    /// returned result. Lines are numbered from 1 and every complete line
    /// advances the counter, whether it matched, was ignored, or was clean.
    /// Lines have no length limit.
    pub fn process_file(&self, path: &Path) -> FileScanResult {
        trace!("Processing file: {}", path.display());
        let mut result = FileScanResult::new(path);

        if self.cancel.is_cancelled() {
            result.scan_error = Some(ScanError::cancelled(path));
            return result;
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to open {}: {}", path.display(), e);
                result.scan_error = Some(ScanError::from_open_error(path, e));
                return result;
            }
        };

        // Declared before the reader so the count drops after the handle closes
        let _open = OpenFileGuard::new(self.metrics);
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut line = Vec::with_capacity(LINE_CAPACITY);
        let mut line_number = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                result.scan_error = Some(ScanError::cancelled(path));
                break;
            }

            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(n) => {
                    line_number += 1;
                    self.metrics.record_line(n as u64);

                    let text = trim_line_ending(&line);
                    if self.target.classify_line(text) == LineVerdict::Matched {
                        result
                            .matched_lines
                            .insert(line_number, String::from_utf8_lossy(text).into_owned());
                    }
                }
                Err(e) => {
                    warn!(
                        "Read failed in {} after line {}: {}",
                        path.display(),
                        line_number,
                        e
                    );
                    result.scan_error = Some(ScanError::IoError(e));
                    break;
                }
            }
        }

        result
    }
}
