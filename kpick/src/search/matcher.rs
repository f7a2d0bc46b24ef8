use regex::bytes::Regex;

use crate::errors::{ScanError, SearchResult};

/// Lines containing at least one Hangul syllable or jamo
pub const HANGUL_PATTERN: &str = r"\p{Hangul}";

/// Common single-line and block comment markers (`#`, `//`, `/*`, `*/`, `<!--`, `-->`)
pub const COMMENT_PATTERN: &str = r"#|//|/\*|<!--|-->|\*/";

/// Outcome of testing one line against a [`ScanTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict {
    /// The ignore pattern matched; the line is never reported
    Ignored,
    /// The match pattern matched and the ignore pattern did not
    Matched,
    /// Neither pattern matched
    Clean,
}

/// The compiled patterns for one run.
///
/// Built once and shared read-only by every scan task. Patterns run against
/// raw line bytes so files that are not valid UTF-8 are still scanned.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    matcher: Regex,
    ignore: Option<Regex>,
}

impl ScanTarget {
    /// Compiles the match pattern and the optional ignore pattern.
    ///
    /// An empty ignore pattern is treated as no ignore pattern.
    pub fn new(match_pattern: &str, ignore_pattern: Option<&str>) -> SearchResult<Self> {
        let matcher = compile(match_pattern)?;
        let ignore = match ignore_pattern.filter(|p| !p.is_empty()) {
            Some(p) => Some(compile(p)?),
            None => None,
        };
        Ok(Self { matcher, ignore })
    }

    /// A target that reports every line containing Hangul.
    pub fn hangul() -> SearchResult<Self> {
        Self::new(HANGUL_PATTERN, None)
    }

    pub fn match_pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn ignore_pattern(&self) -> Option<&str> {
        self.ignore.as_ref().map(Regex::as_str)
    }

    /// Classifies a single line. Ignore takes precedence over match.
    pub fn classify_line(&self, line: &[u8]) -> LineVerdict {
        if self.ignore.as_ref().is_some_and(|ig| ig.is_match(line)) {
            LineVerdict::Ignored
        } else if self.matcher.is_match(line) {
            LineVerdict::Matched
        } else {
            LineVerdict::Clean
        }
    }
}

fn compile(pattern: &str) -> SearchResult<Regex> {
    Regex::new(pattern).map_err(|e| ScanError::invalid_pattern(pattern, e))
}
