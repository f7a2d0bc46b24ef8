use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::SearchResult;
use crate::filters::ALL_EXTENSIONS;
use crate::search::matcher::{ScanTarget, HANGUL_PATTERN};

/// Configuration for a scan run.
///
/// # Configuration Locations
///
/// Values are layered in order of precedence, lowest first:
/// 1. Global `$CONFIG_DIR/kpick/config.yaml`
/// 2. Local `.kpick.yaml` in the current directory
/// 3. Custom config file specified via `--config`
/// 4. Command-line flags (see [`ScanConfig::merge_with_cli`])
///
/// # Configuration Format
///
/// ```yaml
/// # Directory to walk
/// root_path: "."
///
/// # Only scan files with this extension ("*" for all)
/// file_extension: "md"
///
/// # Extra path fragments to skip (".git" and "tmp" are always skipped)
/// skip_paths:
///   - "node_modules"
///   - "vendor"
///
/// # Lines matching this are reported
/// match_pattern: "\\p{Hangul}"
///
/// # Lines matching this are never reported
/// ignore_pattern: "^\\s*//"
///
/// # Worker threads (default: CPU cores)
/// thread_count: 8
///
/// # Override the open file limit used to size chunks
/// max_open_files: 1024
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root directory to walk
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Extension after the last `.` of the file name, or `*` for every file
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Path fragments to skip, unioned with the defaults
    #[serde(default)]
    pub skip_paths: Vec<String>,

    /// Lines matching this pattern are reported
    #[serde(default = "default_match_pattern")]
    pub match_pattern: String,

    /// Lines matching this pattern are excluded even if they match
    #[serde(default)]
    pub ignore_pattern: Option<String>,

    /// Print every file as it starts and finishes
    #[serde(default)]
    pub verbose: bool,

    /// Ask for confirmation before scanning
    #[serde(default)]
    pub interactive: bool,

    /// Only print scan errors
    #[serde(default)]
    pub error_only: bool,

    /// Number of worker threads
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Open file limit to use instead of the one reported by the OS
    #[serde(default)]
    pub max_open_files: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_extension() -> String {
    ALL_EXTENSIONS.to_string()
}

fn default_match_pattern() -> String {
    HANGUL_PATTERN.to_string()
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            file_extension: default_file_extension(),
            skip_paths: Vec::new(),
            match_pattern: default_match_pattern(),
            ignore_pattern: None,
            verbose: false,
            interactive: false,
            error_only: false,
            thread_count: default_thread_count(),
            max_open_files: None,
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an optional file.
    ///
    /// A custom file that does not exist is an error; missing default files
    /// are skipped.
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("kpick/config.yaml")),
            Some(PathBuf::from(".kpick.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// CLI values win whenever they differ from the defaults. Skip fragments
    /// are combined rather than replaced.
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        if cli_config.root_path != default_root_path() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.file_extension != default_file_extension() {
            self.file_extension = cli_config.file_extension;
        }
        for fragment in cli_config.skip_paths {
            if !self.skip_paths.contains(&fragment) {
                self.skip_paths.push(fragment);
            }
        }
        if cli_config.match_pattern != default_match_pattern() {
            self.match_pattern = cli_config.match_pattern;
        }
        if cli_config.ignore_pattern.is_some() {
            self.ignore_pattern = cli_config.ignore_pattern;
        }
        self.verbose |= cli_config.verbose;
        self.interactive |= cli_config.interactive;
        self.error_only |= cli_config.error_only;
        if cli_config.thread_count != default_thread_count() {
            self.thread_count = cli_config.thread_count;
        }
        if cli_config.max_open_files.is_some() {
            self.max_open_files = cli_config.max_open_files;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }

    /// Compiles the match and ignore patterns
    pub fn scan_target(&self) -> SearchResult<ScanTarget> {
        ScanTarget::new(&self.match_pattern, self.ignore_pattern.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScanError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            root_path: "docs"
            file_extension: "md"
            skip_paths: ["node_modules", "vendor"]
            match_pattern: "TODO"
            ignore_pattern: "^#"
            verbose: true
            thread_count: 4
            max_open_files: 256
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root_path, PathBuf::from("docs"));
        assert_eq!(config.file_extension, "md");
        assert_eq!(config.skip_paths, vec!["node_modules", "vendor"]);
        assert_eq!(config.match_pattern, "TODO");
        assert_eq!(config.ignore_pattern.as_deref(), Some("^#"));
        assert!(config.verbose);
        assert!(!config.interactive);
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.max_open_files, Some(256));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"file_extension: \"go\"\n").unwrap();

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root_path, PathBuf::from("."));
        assert_eq!(config.file_extension, "go");
        assert!(config.skip_paths.is_empty());
        assert_eq!(config.match_pattern, HANGUL_PATTERN);
        assert_eq!(config.ignore_pattern, None);
        assert!(!config.error_only);
        assert_eq!(config.max_open_files, None);
        assert_eq!(
            config.thread_count,
            NonZeroUsize::new(num_cpus::get()).unwrap()
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = ScanConfig {
            root_path: PathBuf::from("src"),
            file_extension: "rs".to_string(),
            skip_paths: vec!["target".to_string()],
            ignore_pattern: Some("//".to_string()),
            max_open_files: Some(512),
            ..ScanConfig::default()
        };

        let cli_config = ScanConfig {
            root_path: PathBuf::from("docs"),
            skip_paths: vec!["target".to_string(), "vendor".to_string()],
            match_pattern: "FIXME".to_string(),
            error_only: true,
            ..ScanConfig::default()
        };

        let merged = file_config.merge_with_cli(cli_config);
        assert_eq!(merged.root_path, PathBuf::from("docs")); // CLI value
        assert_eq!(merged.file_extension, "rs"); // File value (CLI default)
        assert_eq!(merged.skip_paths, vec!["target", "vendor"]); // Union
        assert_eq!(merged.match_pattern, "FIXME"); // CLI value
        assert_eq!(merged.ignore_pattern.as_deref(), Some("//")); // File value
        assert!(merged.error_only); // CLI value
        assert_eq!(merged.max_open_files, Some(512)); // File value
    }

    #[test]
    fn test_scan_target_from_config() {
        let config = ScanConfig {
            ignore_pattern: Some("#".to_string()),
            ..ScanConfig::default()
        };
        let target = config.scan_target().unwrap();
        assert_eq!(target.match_pattern(), HANGUL_PATTERN);
        assert_eq!(target.ignore_pattern(), Some("#"));

        let config = ScanConfig {
            match_pattern: "[".to_string(),
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.scan_target(),
            Err(ScanError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"thread_count: \"invalid\"\nskip_paths: 3\n")
            .unwrap();

        let result = ScanConfig::load_from(Some(&config_path));
        assert!(matches!(result, Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ScanConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }
}
