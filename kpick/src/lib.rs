pub mod config;
pub mod errors;
pub mod filters;
pub mod limits;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::ScanConfig;
pub use errors::{ScanError, SearchResult};
pub use limits::{partition, ResourceGovernor};
pub use results::{FileScanResult, ResultAggregator, RunSummary, ScanReport};
pub use search::{scan, scan_with_hooks, ScanEngine, ScanHooks, ScanTarget};
