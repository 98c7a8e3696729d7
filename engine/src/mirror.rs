//! The mirror engine: walk, reconcile, detect, copy, reap.
//!
//! A `Mirror` owns one run. `start()` spawns a single worker thread that
//! walks the source tree depth-first; the caller polls `status()` and
//! `drain_messages()` from any thread and may request cancellation with
//! `stop()`, which blocks until the worker has exited. Once the worker
//! observes the flag no further filesystem mutation happens, so after
//! `stop()` returns the destination tree is quiescent.
//!
//! Per-item failures (an unreadable file, a directory that vanished
//! mid-scan, a failed delete) are logged, queued as messages, and the walk
//! continues with the next sibling. Nothing is retried; the next run picks
//! up whatever was left behind.

use chrono::Local;
use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::checksums;
use crate::error::EngineError;
use crate::filters::{self, FilterSet};
use crate::fs_ops;
use crate::model::{MirrorConfig, MirrorOptions, RunCounters, RunState, StatusSnapshot};

/// Decide whether `source` must be copied over `dest`.
///
/// The decision ladder short-circuits top to bottom: missing destination,
/// then timestamp, then size, then tail-window content. Checks that are
/// not enabled are skipped; with no checks enabled only existence matters.
///
/// # Errors
/// Fails if either file's metadata (or, for the content check, its bytes)
/// cannot be read. Callers treat that as "copy and see".
pub fn needs_copy(source: &Path, dest: &Path, options: &MirrorOptions) -> Result<bool, EngineError> {
    let dest_metadata = match fs::metadata(dest) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => {
            return Err(EngineError::MetadataError {
                path: dest.to_path_buf(),
                source: e,
            })
        }
    };
    let source_metadata = fs::metadata(source).map_err(|e| EngineError::MetadataError {
        path: source.to_path_buf(),
        source: e,
    })?;

    if options.check_timestamp {
        let delta = fs_ops::mtime_secs(&source_metadata) - fs_ops::mtime_secs(&dest_metadata);
        if delta > options.time_tolerance_secs() {
            return Ok(true);
        }
    }

    if options.check_size {
        if options.only_copy_if_bigger {
            if source_metadata.len() > dest_metadata.len() {
                return Ok(true);
            }
        } else if source_metadata.len() != dest_metadata.len() {
            return Ok(true);
        }
    }

    if options.check_content {
        // A longer source cannot share the destination's tail window.
        if source_metadata.len() > dest_metadata.len() {
            return Ok(true);
        }
        let source_crc = checksums::tail_crc32(source, options.quick_content_check)?;
        let dest_crc = checksums::tail_crc32(dest, options.quick_content_check)?;
        return Ok(source_crc != dest_crc);
    }

    Ok(false)
}

/// State shared between the owning handle and the worker thread.
///
/// Counters and state are written only by the worker; the mutexes exist so
/// snapshots and drains from other threads are never torn.
#[derive(Debug)]
struct Shared {
    cancel: AtomicBool,
    state: Mutex<RunState>,
    counters: Mutex<RunCounters>,
    messages: Mutex<Vec<String>>,
}

impl Shared {
    fn new() -> Self {
        Shared {
            cancel: AtomicBool::new(false),
            state: Mutex::new(RunState::Running),
            counters: Mutex::new(RunCounters::default()),
            messages: Mutex::new(Vec::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn counters(&self) -> MutexGuard<'_, RunCounters> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push_message(&self, message: String) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
    }

    fn drain_messages(&self) -> Vec<String> {
        mem::take(&mut *self.messages.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// One mirror run: configuration plus the worker-thread handle.
///
/// The instance exclusively owns its counters, state, and message queue;
/// the filter set is an immutable snapshot shared with the worker.
#[derive(Debug)]
pub struct Mirror {
    id: Uuid,
    config: MirrorConfig,
    filters: Arc<FilterSet>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    started: bool,
}

impl Mirror {
    pub fn new(config: MirrorConfig, filters: Arc<FilterSet>) -> Self {
        Mirror {
            id: Uuid::new_v4(),
            config,
            filters,
            shared: Arc::new(Shared::new()),
            worker: None,
            started: false,
        }
    }

    /// Identifier of this run, carried in the worker's tracing span.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Begin the background walk.
    ///
    /// # Errors
    /// Returns `EngineError::AlreadyStarted` on a second call; terminal
    /// states are final and a fresh run needs a fresh instance.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        self.started = true;

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.shared.push_message(format!("Start scan {}", stamp));
        info!(
            run = %self.id,
            source = %self.config.source_root.display(),
            dest = %self.config.dest_root.display(),
            "start scan"
        );

        let worker = Worker {
            config: self.config.clone(),
            filters: Arc::clone(&self.filters),
            shared: Arc::clone(&self.shared),
        };
        let id = self.id;
        self.worker = Some(thread::spawn(move || {
            let span = info_span!("mirror_run", run = %id);
            let _guard = span.enter();
            worker.run();
        }));
        Ok(())
    }

    /// Request cancellation and block until the worker has exited.
    ///
    /// The worker polls the flag before every file and every directory
    /// descent; an in-flight single-file copy completes (or fails) before
    /// the flag is observed. After this returns, no further filesystem
    /// mutation occurs.
    pub fn stop(&mut self) {
        self.shared.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    /// Consistent point-in-time view of state and counters.
    pub fn status(&self) -> StatusSnapshot {
        let state = *self.shared.state();
        let counters = *self.shared.counters();
        StatusSnapshot { state, counters }
    }

    /// Return and clear all messages queued since the last drain. Each
    /// message is delivered to exactly one caller.
    pub fn drain_messages(&self) -> Vec<String> {
        self.shared.drain_messages()
    }

    pub fn is_running(&self) -> bool {
        *self.shared.state() == RunState::Running
    }
}

impl Drop for Mirror {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The walk itself; lives on the worker thread.
struct Worker {
    config: MirrorConfig,
    filters: Arc<FilterSet>,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(self) {
        let root = self.config.source_root.clone();
        self.walk(&root, true);

        let final_state = if self.cancelled() {
            RunState::Aborted
        } else {
            RunState::Finished
        };
        *self.shared.state() = final_state;

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.shared.push_message(format!("End scan {}", stamp));
        info!(state = %final_state, "end scan");
    }

    fn cancelled(&self) -> bool {
        self.shared.cancel.load(Ordering::Relaxed)
    }

    fn options(&self) -> &MirrorOptions {
        &self.config.options
    }

    /// Process one directory and its descendants, depth-first: gate, then
    /// reconcile, then reap orphans, then files, then subdirectories.
    fn walk(&self, dir: &Path, is_root: bool) {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.options().use_filters && self.filters.is_dir_excluded(&name) {
            self.shared.counters().excluded_dirs += 1;
            debug!(path = %dir.display(), "directory excluded by filter");
            self.shared
                .push_message(format!("Skipping {} - excluded by filter", dir.display()));
            return;
        }

        if filters::is_reserved(&name) {
            self.shared.counters().excluded_dirs += 1;
            error!(path = %dir.display(), "reserved device name");
            self.shared.push_message(format!(
                "Can't process {} in {} - it is a reserved name",
                name,
                dir.display()
            ));
            return;
        }

        let dest_dir = self.reconcile_directory(dir, is_root);

        if self.options().delete_orphans {
            self.reap_orphans(dir, &dest_dir);
            if self.cancelled() {
                return;
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                error!(path = %dir.display(), "access denied");
                self.shared
                    .push_message(format!("Can't process {} - access error.", dir.display()));
                return;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!(path = %dir.display(), "directory vanished during scan");
                self.shared
                    .push_message(format!("Directory not found: {}", dir.display()));
                return;
            }
            Err(e) => {
                let err = EngineError::EnumerationFailed {
                    path: dir.to_path_buf(),
                    source: e,
                };
                error!(%err, "enumeration failed");
                self.shared.push_message(err.to_string());
                return;
            }
        };

        let mut files: Vec<(PathBuf, String)> = Vec::new();
        let mut subdirs: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "unreadable directory entry");
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "unreadable entry type");
                    continue;
                }
            };
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if file_type.is_file() {
                files.push((entry.path(), entry.file_name().to_string_lossy().into_owned()));
            }
        }

        // Files first, then descend; sibling order is whatever the
        // filesystem handed back.
        for (path, file_name) in files {
            if self.cancelled() {
                return;
            }
            if self.options().use_filters && !self.filters.is_file_accepted(&file_name) {
                self.shared.counters().excluded_files += 1;
                debug!(file = %path.display(), "file excluded by filter");
                continue;
            }
            self.process_file(&dest_dir, &path, &file_name);
        }

        for sub in subdirs {
            if self.cancelled() {
                return;
            }
            // Guard against a destination nested inside the source: never
            // descend into the destination root we may have just created.
            if sub == self.config.dest_root {
                continue;
            }
            self.walk(&sub, false);
        }
    }

    /// Map a source directory to its destination twin, creating the twin
    /// (and any missing intermediates) when absent.
    ///
    /// Creation failure is reported but does not abort the branch; file
    /// copies into the missing directory then fail one by one.
    fn reconcile_directory(&self, dir: &Path, is_root: bool) -> PathBuf {
        if !is_root {
            self.shared.counters().source_dirs += 1;
        }

        let rel = dir
            .strip_prefix(&self.config.source_root)
            .unwrap_or_else(|_| Path::new(""));
        let dest = self.config.dest_root.join(rel);

        if dest.is_dir() {
            self.shared.counters().found_dirs += 1;
        } else {
            self.shared.counters().missing_dirs += 1;
            info!(path = %dest.display(), "create destination dir");
            if !self.options().dry_run {
                if let Err(e) = fs::create_dir_all(&dest) {
                    let err = EngineError::DirectoryCreationFailed {
                        path: dest.clone(),
                        source: e,
                    };
                    error!(%err, "reconcile failed");
                    self.shared.push_message(err.to_string());
                }
            }
        }
        dest
    }

    /// Delete destination files with no corresponding source file.
    fn reap_orphans(&self, source_dir: &Path, dest_dir: &Path) {
        let entries = match fs::read_dir(dest_dir) {
            Ok(entries) => entries,
            // Nothing to reap in a destination that does not exist yet.
            Err(_) => return,
        };

        for entry in entries.flatten() {
            if self.cancelled() {
                return;
            }
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let expected_source = source_dir.join(entry.file_name());
            if expected_source.is_file() {
                continue;
            }

            self.shared.counters().deleted += 1;
            info!(path = %entry.path().display(), "deleting orphan");
            if self.options().dry_run {
                continue;
            }
            if let Err(e) = fs::remove_file(entry.path()) {
                let err = EngineError::DeleteFailed {
                    path: entry.path(),
                    source: e,
                };
                warn!(%err, "orphan delete failed");
                self.shared.push_message(err.to_string());
            }
        }
    }

    /// Run change detection for one file and copy it when required.
    fn process_file(&self, dest_dir: &Path, source: &Path, name: &str) {
        self.shared.counters().source_files += 1;
        let dest = dest_dir.join(name);

        let copy = match needs_copy(source, &dest, self.options()) {
            Ok(copy) => copy,
            Err(err) => {
                // Can't compare; copying is the safe answer.
                warn!(%err, "change detection failed, copying anyway");
                self.shared.push_message(err.to_string());
                true
            }
        };
        if !copy {
            return;
        }

        self.shared.counters().copied += 1;
        info!(from = %source.display(), to = %dest.display(), "copy");
        if self.options().dry_run {
            return;
        }
        if let Err(err) = fs_ops::copy_file(source, &dest) {
            warn!(%err, "copy failed");
            self.shared.push_message(err.to_string());
        }
    }
}
