use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks file and descriptor usage across a run
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Descriptor usage
    open_files: Arc<AtomicU64>,
    peak_open_files: Arc<AtomicU64>,

    // Throughput
    files_opened: Arc<AtomicU64>,
    lines_read: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            open_files: Arc::new(AtomicU64::new(0)),
            peak_open_files: Arc::new(AtomicU64::new(0)),
            files_opened: Arc::new(AtomicU64::new(0)),
            lines_read: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a file being opened and updates the peak
    pub fn record_open(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
        let current = self.open_files.fetch_add(1, Ordering::SeqCst) + 1;
        let mut peak = self.peak_open_files.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_open_files.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
        debug!("File opened, {} currently open", current);
    }

    /// Records a file handle being dropped
    pub fn record_close(&self) {
        self.open_files.fetch_sub(1, Ordering::SeqCst);
    }

    /// Records one complete line of `bytes` length
    pub fn record_line(&self, bytes: u64) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            open_files: self.open_files.load(Ordering::SeqCst),
            peak_open_files: self.peak_open_files.load(Ordering::Relaxed),
            files_opened: self.files_opened.load(Ordering::Relaxed),
            lines_read: self.lines_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Files opened: {}\n\
             Peak open files: {}\n\
             Lines read: {}\n\
             Bytes read: {}",
            stats.files_opened, stats.peak_open_files, stats.lines_read, stats.bytes_read
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub open_files: u64,
    pub peak_open_files: u64,
    pub files_opened: u64,
    pub lines_read: u64,
    pub bytes_read: u64,
}

/// Keeps the open-file count accurate for as long as a file handle lives.
pub(crate) struct OpenFileGuard<'a> {
    metrics: &'a ScanMetrics,
}

impl<'a> OpenFileGuard<'a> {
    pub(crate) fn new(metrics: &'a ScanMetrics) -> Self {
        metrics.record_open();
        Self { metrics }
    }
}

impl Drop for OpenFileGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_tracking() {
        let metrics = ScanMetrics::new();

        metrics.record_open();
        metrics.record_open();
        let stats = metrics.get_stats();
        assert_eq!(stats.open_files, 2);
        assert_eq!(stats.peak_open_files, 2);

        metrics.record_close();
        let stats = metrics.get_stats();
        assert_eq!(stats.open_files, 1);
        assert_eq!(stats.peak_open_files, 2); // Peak should remain unchanged
        assert_eq!(stats.files_opened, 2);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let metrics = ScanMetrics::new();
        {
            let _a = OpenFileGuard::new(&metrics);
            let _b = OpenFileGuard::new(&metrics);
            assert_eq!(metrics.get_stats().open_files, 2);
        }
        let stats = metrics.get_stats();
        assert_eq!(stats.open_files, 0);
        assert_eq!(stats.peak_open_files, 2);
    }

    #[test]
    fn test_line_tracking() {
        let metrics = ScanMetrics::new();
        metrics.record_line(10);
        metrics.record_line(5);
        let stats = metrics.get_stats();
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.bytes_read, 15);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ScanMetrics::new();
        let clone = metrics.clone();
        clone.record_line(1);
        assert_eq!(metrics.get_stats().lines_read, 1);
    }
}
