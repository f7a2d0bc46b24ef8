/// Error types for kpick.
///
/// Two kinds of failure flow through this enum:
///
/// 1. **Setup errors** (invalid regex, missing or non-directory root, walk
///    failures, bad configuration) abort a run before any file is opened and
///    are returned as `Err` from [`crate::scan`].
/// 2. **Per-file errors** (cannot open, read failure mid-file, cancellation)
///    never abort anything. They are stored on the file's
///    [`FileScanResult`](crate::results::FileScanResult) and counted by the
///    aggregator.
///
/// ```rust,ignore
/// match kpick::scan(&config) {
///     Ok(report) => println!("{} files matched", report.summary.files_with_matches),
///     Err(ScanError::InvalidPattern { pattern, .. }) => eprintln!("bad regex: {pattern}"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for setup-level operations
pub type SearchResult<T> = Result<T, ScanError>;

/// Errors that can occur while preparing or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Scan cancelled: {0}")]
    Cancelled(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn cancelled(path: impl Into<PathBuf>) -> Self {
        Self::Cancelled(path.into())
    }

    /// Maps an IO error raised while opening `path` to the most specific variant.
    pub fn from_open_error(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for ScanError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.md");
        let err = ScanError::file_not_found(path);
        assert!(matches!(err, ScanError::FileNotFound(_)));

        let err = ScanError::permission_denied(path);
        assert!(matches!(err, ScanError::PermissionDenied(_)));

        let err = ScanError::cancelled(path);
        assert!(matches!(err, ScanError::Cancelled(_)));

        let err = ScanError::config_error("bad");
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_open_error_mapping() {
        let path = Path::new("missing.md");
        let err = ScanError::from_open_error(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ScanError::FileNotFound(ref p) if p == path));

        let err =
            ScanError::from_open_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ScanError::PermissionDenied(_)));

        let err = ScanError::from_open_error(path, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, ScanError::IoError(_)));
    }

    #[test]
    fn test_error_messages() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ScanError::invalid_pattern("(", source);
        assert!(err.to_string().starts_with("Invalid pattern '(':"));

        let err = ScanError::config_error("Missing required field");
        assert_eq!(err.to_string(), "Configuration error: Missing required field");

        let err = ScanError::NotADirectory(PathBuf::from("a.md"));
        assert_eq!(err.to_string(), "'a.md' is not a directory");

        let err = ScanError::file_not_found("test.md");
        assert_eq!(err.to_string(), "File not found: test.md");
    }
}
