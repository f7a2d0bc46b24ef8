//! Open-file limits and chunk partitioning.
//!
//! The scan engine opens one file per task, and every task in a chunk may be
//! in flight at once. Chunks are therefore sized to half of the process's
//! open-file limit, leaving the other half for descriptors the process
//! already holds (stdio, log files, the walker).

use std::num::NonZeroUsize;
use tracing::debug;

/// Used when the descriptor limit cannot be queried
pub const FALLBACK_OPEN_FILES: usize = 2048;

const MAX_OPEN_FILES: u64 = i32::MAX as u64;

const FALLBACK_NON_ZERO: NonZeroUsize = match NonZeroUsize::new(FALLBACK_OPEN_FILES) {
    Some(n) => n,
    None => panic!("fallback open file limit must be non-zero"),
};

/// Returns the soft `RLIMIT_NOFILE` limit, or [`FALLBACK_OPEN_FILES`] when it
/// cannot be determined. Never fails.
#[cfg(unix)]
pub fn open_file_limit() -> usize {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    // SAFETY: getrlimit only writes into the struct we pass by pointer.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if rc != 0 {
        debug!(
            "getrlimit(RLIMIT_NOFILE) failed: {}, using fallback {}",
            std::io::Error::last_os_error(),
            FALLBACK_OPEN_FILES
        );
        return FALLBACK_OPEN_FILES;
    }

    let current = rlim.rlim_cur as u64;
    if current == 0 {
        return FALLBACK_OPEN_FILES;
    }
    current.min(MAX_OPEN_FILES) as usize
}

#[cfg(not(unix))]
pub fn open_file_limit() -> usize {
    debug!(
        "Open file limit unavailable on this platform, using fallback {}",
        FALLBACK_OPEN_FILES
    );
    FALLBACK_OPEN_FILES
}

/// Decides how many files a single chunk may hold open.
///
/// The limit is captured once, when the governor is built, and stays fixed for
/// the run it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGovernor {
    max_open_files: NonZeroUsize,
}

impl ResourceGovernor {
    /// Uses the limit reported by the operating system
    pub fn from_system() -> Self {
        Self::with_limit(open_file_limit())
    }

    /// Uses an explicit limit; zero falls back to [`FALLBACK_OPEN_FILES`]
    pub fn with_limit(max_open_files: usize) -> Self {
        let max_open_files = NonZeroUsize::new(max_open_files).unwrap_or(FALLBACK_NON_ZERO);
        Self { max_open_files }
    }

    /// Uses `limit` when configured, otherwise the system limit
    pub fn from_override(limit: Option<usize>) -> Self {
        match limit {
            Some(limit) => Self::with_limit(limit),
            None => Self::from_system(),
        }
    }

    pub fn max_open_files(&self) -> usize {
        self.max_open_files.get()
    }

    /// Half of the open-file limit, never less than one
    pub fn chunk_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_open_files.get() >> 1).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for ResourceGovernor {
    fn default() -> Self {
        Self::from_system()
    }
}

/// Splits `items` into contiguous chunks of `chunk_size`, the last one holding
/// the remainder. Empty input yields no chunks.
pub fn partition<T>(items: &[T], chunk_size: NonZeroUsize) -> Vec<&[T]> {
    items.chunks(chunk_size.get()).collect()
}
