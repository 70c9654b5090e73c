//! Plain-data results returned by the organizer.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of one `organize_files` run.
///
/// Every candidate considered lands in exactly one of `organized`, `skipped`
/// or `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub organized: usize,
    pub errors: usize,
    /// Unsafe to move, or gone before it could be processed.
    pub skipped: usize,
    /// Completion time of the run.
    pub last_run: DateTime<Local>,
    /// Files placed per category during this run.
    pub categories: BTreeMap<String, usize>,
    /// The caller stopped the batch early.
    pub cancelled: bool,
}

impl RunStats {
    pub(crate) fn empty(last_run: DateTime<Local>) -> Self {
        Self {
            organized: 0,
            errors: 0,
            skipped: 0,
            last_run,
            categories: BTreeMap::new(),
            cancelled: false,
        }
    }

    /// Number of candidates that reached an outcome.
    pub fn considered(&self) -> usize {
        self.organized + self.skipped + self.errors
    }
}

/// Aggregate of the files directly inside one category directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryStats {
    pub file_count: usize,
    /// Total size in MiB, rounded to two decimals.
    pub total_size_mb: f64,
    /// Newest modification time, `None` when the directory is empty or absent.
    pub last_modified: Option<DateTime<Local>>,
}

impl DirectoryStats {
    pub fn empty() -> Self {
        Self {
            file_count: 0,
            total_size_mb: 0.0,
            last_modified: None,
        }
    }
}

/// Converts a byte count to MiB rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    (mb * 100.0).round() / 100.0
}

/// One entry of a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub category: String,
    pub destination: PathBuf,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizePlan {
    pub moves: Vec<PlannedMove>,
    /// Files held back by the safety checks, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}
