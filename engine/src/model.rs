//! Core data model for mirror runs.
//!
//! This module defines the main data structures for a mirror operation:
//! - MirrorConfig / MirrorOptions: immutable per-run configuration
//! - RunState: the Running/Finished/Aborted lifecycle
//! - RunCounters: progress counters owned by the worker thread
//! - StatusSnapshot: a consistent point-in-time view for pollers

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extra tolerance, in seconds, applied to timestamp comparison when the
/// time-buffer option is on. Absorbs timestamp granularity differences
/// between volumes (FAT stores 2s resolution, network shares drift, etc).
pub const TIME_BUFFER_SECS: i64 = 120;

/// Tail-window size for the quick content check, in bytes.
pub const QUICK_CHECK_WINDOW: u64 = 100_000;

/// Immutable configuration for a mirror run, fixed at construction.
///
/// The source and destination roots must be distinct, non-nested paths.
/// The engine does not validate this; the caller is responsible. The only
/// guard the engine provides is that it never recurses into a source
/// subdirectory that is the destination root, so a violated precondition
/// degrades rather than looping forever.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root of the tree being mirrored
    pub source_root: PathBuf,

    /// Root of the tree being written
    pub dest_root: PathBuf,

    /// Behavior toggles
    pub options: MirrorOptions,
}

impl MirrorConfig {
    pub fn new<P: Into<PathBuf>>(source_root: P, dest_root: P, options: MirrorOptions) -> Self {
        MirrorConfig {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            options,
        }
    }
}

/// Boolean switches controlling change detection and mutation behavior.
///
/// All default to off, which means only file existence is checked: a file
/// already present at the destination is never re-copied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MirrorOptions {
    /// Copy when the source modification time is newer than the destination
    pub check_timestamp: bool,

    /// Allow a 120s slack in the timestamp comparison (only meaningful with
    /// `check_timestamp`)
    pub apply_time_buffer: bool,

    /// Copy when the sizes differ
    pub check_size: bool,

    /// With `check_size`, copy only when the source is larger
    pub only_copy_if_bigger: bool,

    /// Copy when the tail-window CRC-32 of the two files differ
    pub check_content: bool,

    /// With `check_content`, restrict the CRC window to the last 100,000
    /// bytes of large files
    pub quick_content_check: bool,

    /// Delete destination files that have no corresponding source file
    pub delete_orphans: bool,

    /// Apply the wildcard filter lists to directories and files
    pub use_filters: bool,

    /// Count and log every decision but perform no filesystem mutation
    pub dry_run: bool,
}

impl MirrorOptions {
    /// Timestamp comparison slack in seconds: 0, or the fixed buffer.
    pub fn time_tolerance_secs(&self) -> i64 {
        if self.apply_time_buffer {
            TIME_BUFFER_SECS
        } else {
            0
        }
    }
}

/// Lifecycle of a mirror run. Terminal states are final; a new run needs a
/// new `Mirror` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    /// Worker thread is walking the tree
    Running,
    /// The walk exhausted the source tree
    Finished,
    /// `stop()` was observed before natural completion
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "Running"),
            RunState::Finished => write!(f, "Finished"),
            RunState::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Progress counters for one run.
///
/// Zeroed at construction, incremented only by the worker thread, frozen
/// once the run reaches a terminal state. `source_dirs` counts directories
/// below the source root; the root itself is reconciled (and shows up in
/// `found_dirs`/`missing_dirs`) but is not counted as a scanned directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Source directories scanned
    pub source_dirs: u64,

    /// Source files examined (after filtering)
    pub source_files: u64,

    /// Destination directories that had to be created
    pub missing_dirs: u64,

    /// Destination directories that already existed
    pub found_dirs: u64,

    /// Files judged changed and copied (or counted as copied in a dry run)
    pub copied: u64,

    /// Orphaned destination files deleted (or counted in a dry run)
    pub deleted: u64,

    /// Directories skipped by filters or reserved-name gating
    pub excluded_dirs: u64,

    /// Files skipped by filters
    pub excluded_files: u64,
}

/// A consistent point-in-time view of a run, safe to take from any thread.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusSnapshot {
    pub state: RunState,
    pub counters: RunCounters,
}

impl StatusSnapshot {
    /// One-line human-readable status, suitable for a polling display.
    pub fn summary(&self) -> String {
        format!(
            "{}: Scanned {} dirs, {} files. Missing dirs: {}, Copied: {}, Deleted: {}",
            self.state,
            self.counters.source_dirs,
            self.counters.source_files,
            self.counters.missing_dirs,
            self.counters.copied,
            self.counters.deleted,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_tolerance_follows_buffer_flag() {
        let mut options = MirrorOptions::default();
        assert_eq!(options.time_tolerance_secs(), 0);

        options.apply_time_buffer = true;
        assert_eq!(options.time_tolerance_secs(), TIME_BUFFER_SECS);
    }

    #[test]
    fn test_counters_start_zeroed() {
        let counters = RunCounters::default();
        assert_eq!(counters.source_dirs, 0);
        assert_eq!(counters.copied, 0);
        assert_eq!(counters, RunCounters::default());
    }

    #[test]
    fn test_summary_format() {
        let mut counters = RunCounters::default();
        counters.source_dirs = 3;
        counters.source_files = 10;
        counters.missing_dirs = 1;
        counters.copied = 4;

        let snapshot = StatusSnapshot {
            state: RunState::Running,
            counters,
        };
        assert_eq!(
            snapshot.summary(),
            "Running: Scanned 3 dirs, 10 files. Missing dirs: 1, Copied: 4, Deleted: 0"
        );
    }
}
