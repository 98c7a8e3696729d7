//! Error types for the mirror engine.
//!
//! The primary error type is `EngineError`, which represents failures the
//! engine reports to callers or records against a single item. Per-item
//! failures (one file failing to copy, one orphan failing to delete) are
//! logged and queued as messages by the worker; they never abort a run.

use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Errors raised by the mirror engine.
///
/// Only `AlreadyStarted` and filter-compilation failures surface through
/// `Result` at the public API boundary; the filesystem variants are used
/// internally by the worker, which converts them into log lines and
/// queued messages so the walk can continue with the next item.
#[derive(Debug)]
pub enum EngineError {
    /// `start()` was called twice on the same instance
    AlreadyStarted,

    /// A wildcard pattern failed to compile
    InvalidPattern { pattern: String, reason: String },

    /// Failed to enumerate a directory
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// Failed to create a destination directory
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to read from a source file
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write to a destination file
    WriteError { path: PathBuf, source: io::Error },

    /// Failed to delete an orphaned destination file
    DeleteFailed { path: PathBuf, source: io::Error },

    /// Failed to stat a file during change detection
    MetadataError { path: PathBuf, source: io::Error },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => {
                write!(f, "Mirror run already started; create a new instance")
            }
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid wildcard pattern '{}': {}", pattern, reason)
            }
            Self::EnumerationFailed { path, source } => {
                write!(f, "Failed to enumerate directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            Self::ReadError { path, source } => {
                write!(f, "Failed to read file {}: {}", path.display(), source)
            }
            Self::WriteError { path, source } => {
                write!(f, "Failed to write file {}: {}", path.display(), source)
            }
            Self::DeleteFailed { path, source } => {
                write!(f, "Failed to delete file {}: {}", path.display(), source)
            }
            Self::MetadataError { path, source } => {
                write!(f, "Failed to read metadata for {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::MetadataError { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_path() {
        let err = EngineError::ReadError {
            path: PathBuf::from("/tmp/missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let text = err.to_string();
        assert!(text.contains("/tmp/missing.txt"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn test_source_chain_preserved() {
        let err = EngineError::WriteError {
            path: PathBuf::from("/tmp/out.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());

        let err = EngineError::AlreadyStarted;
        assert!(err.source().is_none());
    }
}
