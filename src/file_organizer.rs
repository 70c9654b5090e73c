/// Relocation of files into category directories.
///
/// This module moves a file into `<organized_root>/<category>/`, creating the
/// category directory as needed, picking a collision-free name, taking a backup
/// first when enabled, and tallying the outcome in [`RunCounters`].
use crate::backup::BackupManager;
use crate::naming;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Records a single completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Where the file was before the move.
    pub original_path: PathBuf,
    /// Where the file is now.
    pub new_path: PathBuf,
    /// The category directory it went to.
    pub category: String,
    /// The backup copy, if one was taken.
    pub backup_path: Option<PathBuf>,
}

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to back up {} to {}: {source}", source_path.display(), backup_path.display())]
    BackupFailed {
        source_path: PathBuf,
        backup_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} has no file name component", path.display())]
    NoFileName { path: PathBuf },

    #[error(
        "no free name for {} in {} after {attempts} attempts",
        file_name.display(),
        directory.display()
    )]
    NoFreeName {
        directory: PathBuf,
        file_name: PathBuf,
        attempts: u32,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Organized and failed counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub organized: usize,
    pub errors: usize,
}

impl RunCounters {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Moves files into category subdirectories of an organized-files root.
#[derive(Debug, Clone)]
pub struct Mover {
    root: PathBuf,
    backup: BackupManager,
}

impl Mover {
    pub fn new(root: impl Into<PathBuf>, backup: BackupManager) -> Self {
        Self {
            root: root.into(),
            backup,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Moves `file_path` into `category` and records the outcome in `counters`.
    ///
    /// Returns true on success. Every failure is logged with the source path and
    /// counted as an error; the file is left where it was.
    pub fn move_to_category(
        &self,
        file_path: &Path,
        category: &str,
        counters: &mut RunCounters,
    ) -> bool {
        match self.move_to_category_with_record(file_path, category) {
            Ok(record) => {
                tracing::info!(
                    from = %record.original_path.display(),
                    to = %record.new_path.display(),
                    category = %record.category,
                    "Moved file"
                );
                counters.organized += 1;
                true
            }
            Err(e) => {
                tracing::error!(path = %file_path.display(), error = %e, "Failed to move file");
                counters.errors += 1;
                false
            }
        }
    }

    /// Moves a file into its category directory and returns what was done.
    ///
    /// The category directory is created if missing. When a file of the same
    /// name already exists there, the incoming file gets the first free
    /// `_<n>` suffix. A backup is attempted before the move; a failed backup
    /// does not prevent the move.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidydesk::backup::BackupManager;
    /// use tidydesk::file_organizer::Mover;
    /// use std::path::Path;
    ///
    /// let mover = Mover::new("/srv/organized", BackupManager::new("/srv/backups", true));
    /// match mover.move_to_category_with_record(Path::new("/home/me/Downloads/a.png"), "images") {
    ///     Ok(record) => println!("Moved to {}", record.new_path.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_to_category_with_record(
        &self,
        file_path: &Path,
        category: &str,
    ) -> OrganizeResult<MoveRecord> {
        let category_path = self.ensure_category_dir(category)?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: file_path.to_path_buf(),
            })?;
        let destination_path = naming::unique_path(&category_path, Path::new(file_name))?;

        let backup_path = self.backup.backup(file_path);

        fs::rename(file_path, &destination_path).map_err(|source| {
            OrganizeError::FileMoveFailure {
                from: file_path.to_path_buf(),
                to: destination_path.clone(),
                source,
            }
        })?;

        Ok(MoveRecord {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category.to_string(),
            backup_path,
        })
    }

    /// Path a file would be moved to right now, without touching the filesystem.
    pub fn planned_destination(&self, file_path: &Path, category: &str) -> OrganizeResult<PathBuf> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: file_path.to_path_buf(),
            })?;
        naming::unique_path(&self.root.join(category), Path::new(file_name))
    }

    fn ensure_category_dir(&self, category: &str) -> OrganizeResult<PathBuf> {
        let category_path = self.root.join(category);
        fs::create_dir_all(&category_path).map_err(|source| {
            OrganizeError::DirectoryCreationFailed {
                path: category_path.clone(),
                source,
            }
        })?;
        Ok(category_path)
    }
}
