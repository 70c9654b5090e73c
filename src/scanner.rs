//! Candidate discovery in watch directories.
//!
//! Scanning is non-recursive: only regular files directly inside each
//! directory are returned. Hidden entries (names starting with `.`) are always
//! skipped; [`ExcludeRules`] can skip more. Output order is whatever the
//! platform's directory enumeration yields.

use crate::config::{ConfigError, ExcludeRules};
use crate::file_category::normalize_extension;
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiled exclusion rules, built once per scanner.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl ScanFilter {
    /// Compiles exclusion rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Whether a file found in a watch directory is a candidate.
    ///
    /// Checks, with early termination: hidden name, exact name, extension,
    /// glob on the name, regex on the name.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let Some(file_name) = file_path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if is_hidden(&file_name) {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Enumerates candidate files from watch directories.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    filter: ScanFilter,
}

impl Scanner {
    pub fn new(filter: ScanFilter) -> Self {
        Self { filter }
    }

    /// Collects candidates from every directory in turn.
    ///
    /// Missing or unreadable directories are logged and contribute nothing;
    /// scanning continues with the next one.
    pub fn scan<P: AsRef<Path>>(&self, directories: &[P]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in directories {
            files.extend(self.scan_directory(dir.as_ref()));
        }
        files
    }

    fn scan_directory(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Directory not found");
            return Vec::new();
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory entry");
                    continue;
                }
            };

            // Symlinks are not regular files and are left alone.
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                let path = entry.path();
                if self.filter.should_include(&path) {
                    files.push(path);
                } else {
                    tracing::debug!(path = %path.display(), "Excluded from scan");
                }
            }
        }

        tracing::debug!(path = %dir.display(), count = files.len(), "Scanned directory");
        files
    }
}
