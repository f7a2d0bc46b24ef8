/// Candidate discovery: a plain recursive listing of the root, filtered by
/// filename extension and by a skip-path regex.
///
/// Unlike a code search tool this walk does not honour `.gitignore` or hide
/// dotfiles; the only exclusions are the skip fragments, which always include
/// [`DEFAULT_SKIP_PATHS`].
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::{ScanError, SearchResult};

/// Extension filter value that accepts every file
pub const ALL_EXTENSIONS: &str = "*";

/// Fragments that are always skipped, whatever the user configures
pub const DEFAULT_SKIP_PATHS: &[&str] = &[".git", "tmp"];

/// Skip-path fragments compiled into a single alternation
#[derive(Debug, Clone)]
pub struct SkipPaths {
    regex: Regex,
}

impl SkipPaths {
    /// Builds the skip regex from user fragments unioned with the defaults.
    ///
    /// Fragments are regex syntax, joined with `|`. Blank fragments are dropped.
    pub fn new<S: AsRef<str>>(fragments: &[S]) -> SearchResult<Self> {
        let mut all: Vec<&str> = DEFAULT_SKIP_PATHS.to_vec();
        for fragment in fragments {
            let fragment = fragment.as_ref().trim();
            if !fragment.is_empty() && !all.contains(&fragment) {
                all.push(fragment);
            }
        }

        let pattern = all.join("|");
        let regex = Regex::new(&pattern).map_err(|e| ScanError::invalid_pattern(&pattern, e))?;
        Ok(Self { regex })
    }

    /// Parses a comma-delimited fragment list such as `node_modules,vendor`
    pub fn from_delimited(list: &str) -> SearchResult<Self> {
        Self::new(&split_fragments(list))
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_skipped(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}

/// Splits a comma-delimited list into trimmed, non-empty fragments
pub fn split_fragments(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Fails unless `path` exists and is a directory
pub fn check_root(path: &Path) -> SearchResult<()> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::DirectoryNotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ScanError::permission_denied(path),
        _ => ScanError::IoError(e),
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Checks the text after the last `.` of the file name against `extension`
pub fn has_extension(path: &Path, extension: &str) -> bool {
    if extension.is_empty() || extension == ALL_EXTENSIONS {
        return true;
    }
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext == extension))
        .unwrap_or(false)
}

/// Walks `root` and returns every file passing the extension and skip filters,
/// in file-name order. The skip regex sees paths relative to `root`.
pub fn find_files(root: &Path, extension: &str, skip: &SkipPaths) -> SearchResult<Vec<PathBuf>> {
    check_root(root)?;

    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if skip.is_skipped(path.strip_prefix(root).unwrap_or(path)) {
            trace!("Skipping {}", path.display());
            continue;
        }
        if has_extension(path, extension) {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} candidate files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("test.md"), "md"));
        assert!(has_extension(Path::new("dir/archive.tar.gz"), "gz"));
        assert!(!has_extension(Path::new("test.go"), "md"));
        assert!(!has_extension(Path::new("test.MD"), "md")); // Case sensitive
        assert!(has_extension(Path::new("Makefile"), "*"));
        assert!(!has_extension(Path::new("Makefile"), "Makefile"));
        assert!(has_extension(Path::new("test.go"), ""));
    }

    #[test]
    fn test_skip_paths_always_include_defaults() {
        let skip = SkipPaths::new::<&str>(&[]).unwrap();
        assert!(skip.is_skipped(Path::new("repo/.git/config")));
        assert!(skip.is_skipped(Path::new("repo/tmp/a.md")));
        assert!(skip.is_skipped(Path::new(".tmp")));
        assert!(!skip.is_skipped(Path::new("invalid")));
    }

    #[test]
    fn test_skip_paths_from_delimited() {
        let skip = SkipPaths::from_delimited("node_modules, vendor,,").unwrap();
        assert_eq!(skip.as_str(), ".git|tmp|node_modules|vendor");
        assert!(skip.is_skipped(Path::new("web/node_modules/x.js")));
        assert!(skip.is_skipped(Path::new("vendor/lib.go")));
        assert!(!skip.is_skipped(Path::new("src/main.go")));
    }

    #[test]
    fn test_split_fragments() {
        assert_eq!(split_fragments(" node_modules, vendor,,"), vec!["node_modules", "vendor"]);
        assert!(split_fragments("").is_empty());
        assert!(split_fragments(" , ").is_empty());
    }

    #[test]
    fn test_invalid_skip_fragment() {
        let err = SkipPaths::from_delimited("(").unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { .. }));
    }

    #[test]
    fn test_check_root() {
        let dir = tempdir().unwrap();
        assert!(check_root(dir.path()).is_ok());

        let file = dir.path().join("a.md");
        fs::write(&file, "a").unwrap();
        assert!(matches!(check_root(&file), Err(ScanError::NotADirectory(_))));

        let missing = dir.path().join("invalid");
        assert!(matches!(
            check_root(&missing),
            Err(ScanError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_find_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/nested")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("b.md"), "b").unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("main.go"), "go").unwrap();
        fs::write(root.join("docs/nested/c.md"), "c").unwrap();
        fs::write(root.join(".git/HEAD.md"), "ref").unwrap();
        fs::write(root.join("build/out.md"), "out").unwrap();

        let skip = SkipPaths::from_delimited("build").unwrap();
        let files = find_files(root, "md", &skip).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("docs/nested/c.md"),
            ]
        );

        let all = find_files(root, ALL_EXTENSIONS, &skip).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_find_files_missing_root() {
        let skip = SkipPaths::new::<&str>(&[]).unwrap();
        let result = find_files(Path::new("definitely/not/here"), "md", &skip);
        assert!(result.is_err());
    }
}
