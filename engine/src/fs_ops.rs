//! Low-level filesystem operations.
//!
//! Copying preserves the source modification time so that timestamp-based
//! change detection is idempotent across runs: a file copied once compares
//! equal on the next scan.
//!
//! `copy_file` deliberately does not create missing parent directories.
//! Directory creation belongs to the reconciler; if that failed, each file
//! copy into the absent directory fails (and is reported) individually.

use crate::error::EngineError;
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;

/// Copy `src` over `dst`, replacing any existing destination file, and
/// carry the source modification time across.
///
/// # Errors
/// Returns `EngineError::ReadError` / `WriteError` naming the side that
/// failed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_metadata = src_file.metadata().map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;
    let src_mtime = FileTime::from_last_modification_time(&src_metadata);

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let bytes_copied = io::copy(&mut src_file, &mut dst_file).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            }
        } else {
            EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;
    drop(dst_file);

    // Best effort; a copy that landed but keeps its new mtime is still a
    // copy.
    let _ = filetime::set_file_mtime(dst, src_mtime);

    Ok(bytes_copied)
}

/// Modification time of an already-fetched metadata block, as unix seconds.
pub fn mtime_secs(metadata: &fs::Metadata) -> i64 {
    FileTime::from_last_modification_time(metadata).unix_seconds()
}
