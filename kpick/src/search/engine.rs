use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::matcher::ScanTarget;
use super::processor::FileProcessor;
use crate::config::ScanConfig;
use crate::errors::{ScanError, SearchResult};
use crate::filters::{find_files, SkipPaths};
use crate::limits::{partition, ResourceGovernor};
use crate::metrics::ScanMetrics;
use crate::results::{FileScanResult, ResultAggregator, ScanReport};

/// Observability callbacks invoked around every file scan.
///
/// Called from worker threads, so implementations must be `Sync`.
pub trait ScanHooks: Sync {
    fn on_start(&self, _path: &Path) {}
    fn on_done(&self, _path: &Path) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ScanHooks for NoopHooks {}

/// Adapts a pair of closures into [`ScanHooks`]
pub struct FnHooks<S, D> {
    start: S,
    done: D,
}

impl<S, D> FnHooks<S, D>
where
    S: Fn(&Path) + Sync,
    D: Fn(&Path) + Sync,
{
    pub fn new(start: S, done: D) -> Self {
        Self { start, done }
    }
}

impl<S, D> ScanHooks for FnHooks<S, D>
where
    S: Fn(&Path) + Sync,
    D: Fn(&Path) + Sync,
{
    fn on_start(&self, path: &Path) {
        (self.start)(path)
    }

    fn on_done(&self, path: &Path) {
        (self.done)(path)
    }
}

/// Shared flag that stops a run between lines.
///
/// Files that have not started yet, and files in the middle of being read,
/// finish with [`ScanError::Cancelled`] once the flag is raised, so a cancelled
/// run still yields one result per path.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Chunked fan-out/fan-in scanner.
///
/// Each chunk is at most [`ResourceGovernor::chunk_size`] files. Every file in
/// a chunk becomes one task on a fixed-size worker pool, and results flow back
/// through a single channel. The next chunk starts only after every task of
/// the current one has published, which caps the number of files open at once.
#[derive(Debug)]
pub struct ScanEngine {
    pool: ThreadPool,
    governor: ResourceGovernor,
    metrics: ScanMetrics,
    cancel: CancelFlag,
}

impl ScanEngine {
    /// Creates an engine with `thread_count` workers
    pub fn new(thread_count: NonZeroUsize, governor: ResourceGovernor) -> SearchResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count.get())
            .thread_name(|idx| format!("kpick-scan-{idx}"))
            .build()
            .map_err(|e| ScanError::config_error(format!("failed to build worker pool: {e}")))?;

        Ok(Self {
            pool,
            governor,
            metrics: ScanMetrics::new(),
            cancel: CancelFlag::new(),
        })
    }

    /// Creates an engine from the thread count and open-file override in `config`
    pub fn from_config(config: &ScanConfig) -> SearchResult<Self> {
        Self::new(
            config.thread_count,
            ResourceGovernor::from_override(config.max_open_files),
        )
    }

    /// Replaces the cancel flag, e.g. with one shared with a signal handler
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Scans one chunk and returns a result for every path, in arrival order.
    ///
    /// Blocks until the whole chunk is done.
    pub fn scan_chunk<P>(
        &self,
        chunk: &[P],
        target: &ScanTarget,
        hooks: &dyn ScanHooks,
    ) -> Vec<FileScanResult>
    where
        P: AsRef<Path> + Sync,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let processor = FileProcessor::new(target, &self.metrics, &self.cancel);

        self.pool.scope(|scope| {
            for path in chunk {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let path = path.as_ref();
                    hooks.on_start(path);
                    let result = processor.process_file(path);
                    hooks.on_done(path);
                    // The receiver lives until after the scope, so this cannot fail
                    let _ = tx.send(result);
                });
            }
        });
        drop(tx);

        rx.into_iter().collect()
    }

    /// Scans every path, one chunk at a time, and returns the path-ordered report
    pub fn run<P>(&self, paths: &[P], target: &ScanTarget, hooks: &dyn ScanHooks) -> ScanReport
    where
        P: AsRef<Path> + Sync,
    {
        let chunk_size = self.governor.chunk_size();
        let chunks = partition(paths, chunk_size);
        info!(
            "Scanning {} files in {} chunks of up to {} (open file limit {})",
            paths.len(),
            chunks.len(),
            chunk_size,
            self.governor.max_open_files()
        );

        let mut aggregator = ResultAggregator::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                "Chunk {}/{}: {} files",
                idx + 1,
                chunks.len(),
                chunk.len()
            );
            aggregator.extend(self.scan_chunk(chunk, target, hooks));
        }

        self.metrics.log_stats();
        let report = aggregator.finish();
        info!(
            "Scan complete. {} files scanned, {} errors, {} files matched",
            report.summary.files_scanned, report.summary.errors, report.summary.files_with_matches
        );
        report
    }
}

/// Walks, compiles and scans according to `config`
pub fn scan(config: &ScanConfig) -> SearchResult<ScanReport> {
    scan_with_hooks(config, &NoopHooks)
}

/// Like [`scan`], calling `hooks` around every file
pub fn scan_with_hooks(config: &ScanConfig, hooks: &dyn ScanHooks) -> SearchResult<ScanReport> {
    info!(
        "Starting scan of {} with pattern {:?}",
        config.root_path.display(),
        config.match_pattern
    );

    let target = config.scan_target()?;
    let skip = SkipPaths::new(config.skip_paths.as_slice())?;
    let files = find_files(&config.root_path, &config.file_extension, &skip)?;

    if files.is_empty() {
        debug!("No candidate files found, returning empty report");
        return Ok(ScanReport::new());
    }

    let engine = ScanEngine::from_config(config)?;
    Ok(engine.run(&files, &target, hooks))
}
