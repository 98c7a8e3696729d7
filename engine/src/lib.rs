//! # DirMirror Engine - Directory Mirroring Library
//!
//! A headless engine for mirroring a source directory tree onto a
//! destination tree. Designed as the foundation for multiple UIs
//! (CLI, GUI, automation).
//!
//! ## Overview
//!
//! The engine walks the source tree on a single background worker thread,
//! creating missing destination directories, copying files judged changed
//! under configurable comparison policies (timestamp, size, tail-window
//! CRC-32 content), optionally deleting destination files absent from the
//! source, and optionally filtering directories and files through
//! case-insensitive wildcard pattern lists. The caller polls a thread-safe
//! status snapshot and drains queued diagnostic messages; cancellation is
//! cooperative and `stop()` only returns once the worker has exited.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{FilterSet, Mirror, MirrorConfig, MirrorOptions};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut options = MirrorOptions::default();
//! options.check_timestamp = true;
//! options.delete_orphans = true;
//!
//! let config = MirrorConfig::new("/data/photos", "/backup/photos", options);
//! let mut mirror = Mirror::new(config, Arc::new(FilterSet::empty()));
//! mirror.start()?;
//!
//! while mirror.is_running() {
//!     for message in mirror.drain_messages() {
//!         println!("{}", message);
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(500));
//! }
//! println!("{}", mirror.status().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Configuration, run state, counters, status snapshot
//! - **error**: Error types and handling
//! - **filters**: Wildcard filter lists and reserved-name gating
//! - **checksums**: Tail-window CRC-32 content hashing
//! - **fs_ops**: Low-level filesystem operations
//! - **mirror**: The engine itself (walk, reconcile, detect, copy, reap)

pub mod checksums;
pub mod error;
pub mod filters;
pub mod fs_ops;
pub mod mirror;
pub mod model;

// Re-export main types and functions
pub use error::EngineError;
pub use filters::{is_reserved, FilterSet};
pub use mirror::{needs_copy, Mirror};
pub use model::{
    MirrorConfig, MirrorOptions, RunCounters, RunState, StatusSnapshot, QUICK_CHECK_WINDOW,
    TIME_BUFFER_SECS,
};
