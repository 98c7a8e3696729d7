//! Tail-window CRC-32 content hashing.
//!
//! Change detection never hashes more than it has to: the CRC is computed
//! over a window at the *tail* of the file, since files that grow by
//! appended writes change there first. With the quick check enabled the
//! window is capped at `QUICK_CHECK_WINDOW` bytes; without it the window is
//! the whole file, clamped to `i32::MAX` bytes for pathologically large
//! files (with a warning that the check is partial).
//!
//! Two same-size files with identical tails therefore compare as unchanged
//! even if earlier bytes differ. That is the intended trade-off for cheap
//! scans of large trees, not a correctness guarantee.

use crate::error::EngineError;
use crate::model::QUICK_CHECK_WINDOW;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

/// Standard CRC-32 (zip/PNG polynomial, reflected, init and final XOR
/// 0xFFFFFFFF), fed incrementally.
struct Crc32 {
    crc: u32,
}

impl Crc32 {
    fn new() -> Self {
        Crc32 { crc: 0xffff_ffff }
    }

    fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let mut crc = self.crc ^ byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xedb8_8320
                } else {
                    crc >> 1
                };
            }
            self.crc = crc;
        }
    }

    fn finalize(self) -> u32 {
        self.crc ^ 0xffff_ffff
    }
}

/// Compute the tail-window CRC-32 of a file.
///
/// # Errors
/// Returns `EngineError::ReadError` / `MetadataError` if the file cannot be
/// opened, sized, or read.
pub fn tail_crc32(path: &Path, quick: bool) -> Result<u32, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let size = file
        .metadata()
        .map_err(|e| EngineError::MetadataError {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    let window = window_size(path, size, quick);
    let start = size - window;
    file.seek(SeekFrom::Start(start))
        .map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut hasher = Crc32::new();
    let mut remaining = window;
    let mut buffer = [0u8; 65536];
    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let read = file
            .read(&mut buffer[..want])
            .map_err(|e| EngineError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        if read == 0 {
            // File shrank under us; hash what we got.
            break;
        }
        hasher.update(&buffer[..read]);
        remaining -= read as u64;
    }
    Ok(hasher.finalize())
}

/// Select how many tail bytes to hash for a file of the given size.
fn window_size(path: &Path, size: u64, quick: bool) -> u64 {
    if quick {
        if size > QUICK_CHECK_WINDOW {
            return QUICK_CHECK_WINDOW;
        }
        return size;
    }
    if size > i32::MAX as u64 {
        warn!(
            path = %path.display(),
            "content check restricted to the last {} bytes",
            i32::MAX
        );
        return i32::MAX as u64;
    }
    size
}
