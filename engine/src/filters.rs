//! Wildcard filtering and reserved-name gating.
//!
//! A `FilterSet` holds three compiled pattern lists: directories to
//! exclude, files to include, and files to exclude. Patterns use `*` and
//! `?` wildcards and match case-insensitively against the bare name of the
//! entry, never the full path. A non-empty include list is exclusive: a
//! file must match at least one include pattern, and the exclude list is
//! not consulted at all.
//!
//! The reserved-name gate rejects Windows device names (`con`, `nul`,
//! `com1`..`com9`, ...) that cannot exist as ordinary files or directories
//! on a Windows destination volume, so those subtrees are skipped rather
//! than failed one entry at a time.

use crate::error::EngineError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled, read-only wildcard filter lists for one mirror run.
///
/// Built once from the caller's pattern lists and shared with the worker
/// thread as an immutable snapshot.
#[derive(Debug)]
pub struct FilterSet {
    dir_exclude: GlobSet,
    file_include: GlobSet,
    file_exclude: GlobSet,
    has_includes: bool,
}

impl FilterSet {
    /// Compile the three pattern lists.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidPattern` naming the first pattern that
    /// fails to compile.
    pub fn new(
        dir_exclude: &[String],
        file_include: &[String],
        file_exclude: &[String],
    ) -> Result<Self, EngineError> {
        Ok(FilterSet {
            dir_exclude: compile(dir_exclude)?,
            file_include: compile(file_include)?,
            file_exclude: compile(file_exclude)?,
            has_includes: !file_include.is_empty(),
        })
    }

    /// A filter set with no patterns: excludes no directory, accepts every
    /// file.
    pub fn empty() -> Self {
        FilterSet {
            dir_exclude: GlobSet::empty(),
            file_include: GlobSet::empty(),
            file_exclude: GlobSet::empty(),
            has_includes: false,
        }
    }

    /// True if the directory name matches any exclude pattern.
    pub fn is_dir_excluded(&self, name: &str) -> bool {
        self.dir_exclude.is_match(name)
    }

    /// Apply include/exclude precedence to a file name.
    ///
    /// With a non-empty include list the file must match an include
    /// pattern; excludes are bypassed entirely. Otherwise the file is
    /// rejected only if it matches an exclude pattern.
    pub fn is_file_accepted(&self, name: &str) -> bool {
        if self.has_includes {
            self.file_include.is_match(name)
        } else {
            !self.file_exclude.is_match(name)
        }
    }
}

fn compile(patterns: &[String]) -> Result<GlobSet, EngineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| EngineError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| EngineError::InvalidPattern {
        pattern: String::new(),
        reason: e.to_string(),
    })
}

/// Device names a Windows volume cannot hold as ordinary file or directory
/// names.
const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9", "clock$",
];

/// Case-insensitive test against the reserved device-name set.
///
/// The first-character test short-circuits the scan for the common case;
/// only names starting with one of five letters can possibly be reserved.
pub fn is_reserved(name: &str) -> bool {
    let first = match name.chars().next() {
        Some(c) => c.to_ascii_lowercase(),
        None => return false,
    };
    if !matches!(first, 'c' | 'l' | 'n' | 'a' | 'p') {
        return false;
    }
    RESERVED_NAMES.iter().any(|r| name.eq_ignore_ascii_case(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dir_exclude_is_case_insensitive() {
        let filters =
            FilterSet::new(&patterns(&["node_modules", ".git", "build*"]), &[], &[]).unwrap();

        assert!(filters.is_dir_excluded("node_modules"));
        assert!(filters.is_dir_excluded("Node_Modules"));
        assert!(filters.is_dir_excluded("BUILD-output"));
        assert!(!filters.is_dir_excluded("src"));
    }

    #[test]
    fn test_wildcards_match_names() {
        let filters = FilterSet::new(&[], &[], &patterns(&["*.tmp", "cache?"])).unwrap();

        assert!(!filters.is_file_accepted("scratch.TMP"));
        assert!(!filters.is_file_accepted("cache1"));
        assert!(filters.is_file_accepted("cache12"));
        assert!(filters.is_file_accepted("notes.txt"));
    }

    #[test]
    fn test_include_list_is_exclusive() {
        let filters = FilterSet::new(
            &[],
            &patterns(&["*.doc", "*.xls"]),
            &patterns(&["*.tmp"]),
        )
        .unwrap();

        assert!(filters.is_file_accepted("report.doc"));
        assert!(filters.is_file_accepted("Sheet.XLS"));
        // Matches neither include nor exclude: still rejected.
        assert!(!filters.is_file_accepted("notes.txt"));
        // Include checks bypass excludes; a .tmp matching an include passes.
        let filters = FilterSet::new(&[], &patterns(&["*.tmp"]), &patterns(&["*.tmp"])).unwrap();
        assert!(filters.is_file_accepted("scratch.tmp"));
    }

    #[test]
    fn test_empty_filter_set_accepts_everything() {
        let filters = FilterSet::empty();
        assert!(!filters.is_dir_excluded("anything"));
        assert!(filters.is_file_accepted("anything.tmp"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = FilterSet::new(&patterns(&["[unclosed"]), &[], &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("con"));
        assert!(is_reserved("CON"));
        assert!(is_reserved("Nul"));
        assert!(is_reserved("COM1"));
        assert!(is_reserved("lpt9"));
        assert!(is_reserved("clock$"));

        assert!(!is_reserved("console"));
        assert!(!is_reserved("com10"));
        assert!(!is_reserved("lpt0"));
        assert!(!is_reserved("readme"));
        assert!(!is_reserved(""));
    }
}
