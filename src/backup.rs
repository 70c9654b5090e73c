//! Dated copies of files taken before they are moved.
//!
//! Backups land in `<backup_root>/<YYYYMMDD>/<file name>`, with the same
//! `_<n>` suffixing as the category directories when a name is taken.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::naming;
use chrono::{Local, NaiveDate};
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

/// Format of the per-day backup directory name.
pub const BACKUP_DATE_FORMAT: &str = "%Y%m%d";

/// Copies files into a date-keyed backup area when backups are enabled.
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
    enabled: bool,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            root: root.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directory that backups taken on `date` go to.
    pub fn dated_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(date.format(BACKUP_DATE_FORMAT).to_string())
    }

    /// Copies `path` into today's backup directory.
    ///
    /// Returns `None` when backups are disabled or the copy failed; failures are
    /// logged and never stop the caller from moving the file.
    pub fn backup(&self, path: &Path) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        match self.backup_on(path, Local::now().date_naive()) {
            Ok(backup_path) => {
                tracing::debug!(
                    path = %path.display(),
                    backup = %backup_path.display(),
                    "Backed up file"
                );
                Some(backup_path)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Backup failed");
                None
            }
        }
    }

    fn backup_on(&self, path: &Path, date: NaiveDate) -> OrganizeResult<PathBuf> {
        let dir = self.dated_dir(date);
        fs::create_dir_all(&dir).map_err(|source| OrganizeError::DirectoryCreationFailed {
            path: dir.clone(),
            source,
        })?;

        let file_name = path.file_name().ok_or_else(|| OrganizeError::NoFileName {
            path: path.to_path_buf(),
        })?;
        let backup_path = naming::unique_path(&dir, Path::new(file_name))?;

        fs::copy(path, &backup_path).map_err(|source| OrganizeError::BackupFailed {
            source_path: path.to_path_buf(),
            backup_path: backup_path.clone(),
            source,
        })?;
        // The copy is complete at this point; lost timestamps do not undo it.
        if let Err(e) = copy_timestamps(path, &backup_path) {
            tracing::warn!(
                backup = %backup_path.display(),
                error = %e,
                "Backup kept without original timestamps"
            );
        }

        Ok(backup_path)
    }
}

/// `fs::copy` carries permissions but not times; carry the access and modification times over.
///
/// The copy is opened read-only, since it inherits read-only permission bits from its source.
fn copy_timestamps(from: &Path, to: &Path) -> OrganizeResult<()> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| OrganizeError::Io { path, source }
    };

    let metadata = fs::metadata(from).map_err(io_err(from))?;
    let mut times = FileTimes::new().set_modified(metadata.modified().map_err(io_err(from))?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    File::open(to)
        .and_then(|file| file.set_times(times))
        .map_err(io_err(to))
}
