/// Concurrent, descriptor-bounded line scanning.
///
/// The pieces, leaves first:
///
/// - [`matcher`]: compiles the match and ignore patterns into a [`ScanTarget`]
///   that every worker shares read-only.
/// - [`processor`]: reads one file line by line and classifies each line.
/// - [`engine`]: partitions the candidate list into chunks sized from the
///   open-file limit, fans each chunk out over a worker pool, and fans the
///   results back in through one channel before moving to the next chunk.
///
/// ```rust,ignore
/// let target = ScanTarget::new(HANGUL_PATTERN, Some(COMMENT_PATTERN))?;
/// let engine = ScanEngine::new(threads, ResourceGovernor::from_system())?;
/// let report = engine.run(&paths, &target, &NoopHooks);
/// for file in &report.files {
///     println!("{}", file.path.display());
/// }
/// ```
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::{scan, scan_with_hooks, CancelFlag, FnHooks, NoopHooks, ScanEngine, ScanHooks};
pub use matcher::{LineVerdict, ScanTarget, COMMENT_PATTERN, HANGUL_PATTERN};
pub use processor::FileProcessor;
