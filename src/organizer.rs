//! The organize pipeline: scan, gate, categorize, back up, move, tally.
//!
//! An [`Organizer`] owns its configuration and run counters. Runs on one
//! instance are sequential (`&mut self`); use separate instances for
//! concurrent runs.

use crate::backup::BackupManager;
use crate::config::{ConfigError, OrganizerConfig};
use crate::file_category::CategoryTable;
use crate::file_organizer::{Mover, RunCounters};
use crate::safety::SafetyClassifier;
use crate::scanner::{ScanFilter, Scanner};
use crate::stats::{DirectoryStats, OrganizePlan, PlannedMove, RunStats, bytes_to_mb};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Passed to the per-file hook before each candidate is processed.
#[derive(Debug, Clone, Copy)]
pub struct FileProgress<'a> {
    /// Zero-based position in the batch.
    pub index: usize,
    pub total: usize,
    pub path: &'a Path,
}

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Organized(String),
    Skipped,
    Failed,
}

/// Organizes files from watch directories into category directories.
#[derive(Debug)]
pub struct Organizer {
    config: OrganizerConfig,
    table: CategoryTable,
    scanner: Scanner,
    classifier: SafetyClassifier,
    mover: Mover,
    counters: RunCounters,
}

impl Organizer {
    /// Builds an organizer from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the configuration breaks a contract
    /// (see [`OrganizerConfig::validate`]) or an exclusion pattern does not compile.
    pub fn new(config: OrganizerConfig) -> Result<Self, ConfigError> {
        let table = config.validate()?;
        let scanner = Scanner::new(ScanFilter::new(&config.exclude)?);
        let classifier = SafetyClassifier::new(config.settle_interval, config.min_age);
        let mover = Mover::new(
            config.organized_root.clone(),
            BackupManager::new(config.backup_root.clone(), config.backup_enabled),
        );

        Ok(Self {
            config,
            table,
            scanner,
            classifier,
            mover,
            counters: RunCounters::default(),
        })
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.table
    }

    /// Candidates from the configured watch directories.
    pub fn scan(&self) -> Vec<PathBuf> {
        self.scanner.scan(self.config.watch_directories.as_slice())
    }

    /// Candidates from the given directories instead of the configured ones.
    pub fn scan_directories<P: AsRef<Path>>(&self, directories: &[P]) -> Vec<PathBuf> {
        self.scanner.scan(directories)
    }

    /// Organizes `files`, or everything in the watch directories when `None`.
    pub fn organize_files(&mut self, files: Option<&[PathBuf]>) -> RunStats {
        self.organize_files_with(files, |_| ControlFlow::Continue(()))
    }

    /// Scans `directories` and organizes what was found.
    pub fn organize_directories<P: AsRef<Path>>(&mut self, directories: &[P]) -> RunStats {
        let files = self.scanner.scan(directories);
        self.organize_files(Some(files.as_slice()))
    }

    /// Like [`organize_files`](Self::organize_files), calling `on_file` before each candidate.
    ///
    /// Returning `ControlFlow::Break(())` from the hook stops the batch; the
    /// remaining files are not considered and the stats are marked cancelled.
    pub fn organize_files_with<F>(&mut self, files: Option<&[PathBuf]>, mut on_file: F) -> RunStats
    where
        F: FnMut(&FileProgress<'_>) -> ControlFlow<()>,
    {
        self.counters.reset();
        let started = Instant::now();

        let scanned;
        let files = match files {
            Some(files) => files,
            None => {
                scanned = self.scan();
                scanned.as_slice()
            }
        };

        if files.is_empty() {
            tracing::info!("No files to organize");
            return RunStats::empty(Local::now());
        }

        let mut skipped = 0;
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut cancelled = false;

        for (index, path) in files.iter().enumerate() {
            let progress = FileProgress {
                index,
                total: files.len(),
                path,
            };
            if on_file(&progress).is_break() {
                tracing::info!(processed = index, total = files.len(), "Organize run cancelled");
                cancelled = true;
                break;
            }

            match self.process_file(path) {
                Outcome::Organized(category) => *categories.entry(category).or_insert(0) += 1,
                Outcome::Skipped => skipped += 1,
                Outcome::Failed => {}
            }
        }

        let last_run = Local::now();
        let stats = RunStats {
            organized: self.counters.organized,
            errors: self.counters.errors,
            skipped,
            last_run,
            categories,
            cancelled,
        };

        tracing::info!(
            organized = stats.organized,
            skipped = stats.skipped,
            errors = stats.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Organize run complete"
        );
        stats
    }

    /// Runs one candidate through the pipeline. Counters record organized and failed files.
    fn process_file(&mut self, path: &Path) -> Outcome {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Not a regular file, left in place");
                return Outcome::Skipped;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "File vanished before processing");
                return Outcome::Skipped;
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Cannot check file");
                self.counters.errors += 1;
                return Outcome::Failed;
            }
        }

        let verdict = self.classifier.assess(path);
        if !verdict.is_safe() {
            tracing::debug!(path = %path.display(), reason = %verdict, "Not safe to move yet");
            return Outcome::Skipped;
        }

        let category = self.table.categorize(path).to_string();
        if self
            .mover
            .move_to_category(path, &category, &mut self.counters)
        {
            Outcome::Organized(category)
        } else {
            Outcome::Failed
        }
    }

    /// Works out what a run would do without moving, copying or creating anything.
    ///
    /// Destinations account for names already taken in the category directories,
    /// but not for collisions among the planned files themselves.
    pub fn plan(&self, files: Option<&[PathBuf]>) -> OrganizePlan {
        let scanned;
        let files = match files {
            Some(files) => files,
            None => {
                scanned = self.scan();
                scanned.as_slice()
            }
        };

        let mut plan = OrganizePlan::default();
        for path in files {
            if !is_regular_file(path) {
                continue;
            }

            let verdict = self.classifier.assess(path);
            if !verdict.is_safe() {
                plan.skipped.push((path.clone(), verdict.to_string()));
                continue;
            }

            let category = self.table.categorize(path).to_string();
            match self.mover.planned_destination(path, &category) {
                Ok(destination) => plan.moves.push(PlannedMove {
                    source: path.clone(),
                    category,
                    destination,
                }),
                Err(e) => plan.skipped.push((path.clone(), e.to_string())),
            }
        }
        plan
    }

    /// File count, size and newest modification time per known category directory.
    ///
    /// Missing or unreadable directories report [`DirectoryStats::empty`].
    pub fn directory_stats(&self) -> BTreeMap<String, DirectoryStats> {
        self.table
            .known_categories()
            .into_iter()
            .map(|category| {
                let dir = self.config.organized_root.join(category);
                let stats = match collect_dir_stats(&dir) {
                    Ok(stats) => stats,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => DirectoryStats::empty(),
                    Err(e) => {
                        tracing::error!(path = %dir.display(), error = %e, "Cannot read category directory");
                        DirectoryStats::empty()
                    }
                };
                (category.to_string(), stats)
            })
            .collect()
    }

    /// Removes every empty immediate subdirectory of the organized root.
    ///
    /// Returns how many were removed. Non-empty directories stay and are not an error.
    pub fn clean_empty_directories(&self) -> usize {
        let root = &self.config.organized_root;
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %root.display(), error = %e, "Cannot read organized root");
                }
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let path = entry.path();
            match fs::remove_dir(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Removed empty directory");
                    removed += 1;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Directory kept");
                }
            }
        }
        removed
    }
}

/// Regular file, not following symlinks. Directories, FIFOs and sockets are never moved.
fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|metadata| metadata.is_file())
}

fn collect_dir_stats(dir: &Path) -> io::Result<DirectoryStats> {
    let mut file_count = 0;
    let mut total_bytes = 0u64;
    let mut newest: Option<DateTime<Local>> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        file_count += 1;
        total_bytes += metadata.len();
        if let Ok(modified) = metadata.modified() {
            let modified = DateTime::<Local>::from(modified);
            newest = Some(newest.map_or(modified, |current| current.max(modified)));
        }
    }

    Ok(DirectoryStats {
        file_count,
        total_size_mb: bytes_to_mb(total_bytes),
        last_modified: newest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryRule;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Setup {
        _temp: TempDir,
        watch: PathBuf,
        root: PathBuf,
        organizer: Organizer,
    }

    fn setup(backups: bool) -> Setup {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let watch = temp.path().join("watch");
        let root = temp.path().join("organized");
        fs::create_dir(&watch).unwrap();

        let mut config = OrganizerConfig::with_root(&root);
        config.watch_directories = vec![watch.clone()];
        config.backup_root = temp.path().join("backups");
        config.backup_enabled = backups;
        config.settle_interval = Duration::ZERO;
        config.min_age = Duration::from_secs(30);
        config.fallback_category = "Other".to_string();
        config.categories = vec![
            CategoryRule {
                name: "Documents".to_string(),
                extensions: vec![".pdf".to_string()],
            },
            CategoryRule {
                name: "Text".to_string(),
                extensions: vec![".txt".to_string()],
            },
        ];

        let organizer = Organizer::new(config).unwrap();
        Setup {
            _temp: temp,
            watch,
            root,
            organizer,
        }
    }

    fn write_aged(path: &Path, content: &str, age: Duration) {
        fs::write(path, content).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    #[test]
    fn test_empty_watch_dir_yields_zero_stats() {
        let mut s = setup(false);
        let stats = s.organizer.organize_files(None);
        assert_eq!(stats.organized, 0);
        assert_eq!(stats.errors, 0);
        assert!(stats.categories.is_empty());
        assert!(!s.root.exists(), "nothing should be created for an empty run");
    }

    #[test]
    fn test_safe_file_moved_fresh_file_left() {
        let mut s = setup(false);
        write_aged(&s.watch.join("report.pdf"), "pdf", Duration::from_secs(60));
        write_aged(&s.watch.join("partial.zip"), "zip", Duration::from_secs(2));

        let stats = s.organizer.organize_files(None);

        assert!(s.root.join("Documents").join("report.pdf").exists());
        assert!(s.watch.join("partial.zip").exists());
        assert_eq!(stats.organized, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(
            stats.categories,
            BTreeMap::from([("Documents".to_string(), 1)])
        );
    }

    #[test]
    fn test_vanished_file_is_skipped_not_error() {
        let mut s = setup(false);
        let ghost = s.watch.join("ghost.pdf");
        let files = vec![ghost];
        let stats = s.organizer.organize_files(Some(files.as_slice()));
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.considered(), 1);
    }

    #[test]
    fn test_directory_in_file_list_is_left_alone() {
        let mut s = setup(false);
        let project = s.watch.join("project");
        fs::create_dir(&project).unwrap();
        write_aged(&project.join("main.c"), "int main;", Duration::from_secs(60));

        let files = vec![project.clone()];
        let stats = s.organizer.organize_files(Some(files.as_slice()));

        assert!(project.join("main.c").exists());
        assert!(!s.root.join("Other").exists());
        assert_eq!(stats.organized, 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.skipped, 1);
        assert!(s.organizer.plan(Some(files.as_slice())).moves.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_in_file_list_is_left_alone() {
        let mut s = setup(false);
        let target = s.watch.join("real.pdf");
        write_aged(&target, "pdf", Duration::from_secs(60));
        let link = s.watch.join("link.pdf");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let files = vec![link.clone()];
        let stats = s.organizer.organize_files(Some(files.as_slice()));

        assert_eq!(stats.skipped, 1);
        assert!(link.symlink_metadata().is_ok());
        assert!(target.exists());
    }

    #[test]
    fn test_unmapped_extension_goes_to_fallback() {
        let mut s = setup(false);
        write_aged(&s.watch.join("data.bin"), "bin", Duration::from_secs(60));

        let stats = s.organizer.organize_files(None);
        assert!(s.root.join("Other").join("data.bin").exists());
        assert_eq!(stats.categories.get("Other"), Some(&1));
    }

    #[test]
    fn test_counters_reset_between_runs() {
        let mut s = setup(false);
        write_aged(&s.watch.join("a.pdf"), "a", Duration::from_secs(60));
        assert_eq!(s.organizer.organize_files(None).organized, 1);

        write_aged(&s.watch.join("b.txt"), "b", Duration::from_secs(60));
        let second = s.organizer.organize_files(None);
        assert_eq!(second.organized, 1);
        assert_eq!(second.categories, BTreeMap::from([("Text".to_string(), 1)]));
    }

    #[test]
    fn test_hook_can_cancel_batch() {
        let mut s = setup(false);
        let files: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf"]
            .iter()
            .map(|name| {
                let path = s.watch.join(name);
                write_aged(&path, name, Duration::from_secs(60));
                path
            })
            .collect();

        let mut seen = Vec::new();
        let stats = s.organizer.organize_files_with(Some(files.as_slice()), |progress| {
            seen.push(progress.index);
            if progress.index == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(seen, vec![0, 1]);
        assert!(stats.cancelled);
        assert_eq!(stats.organized, 1);
        assert!(files[1].exists());
        assert!(files[2].exists());
    }

    #[test]
    fn test_plan_does_not_touch_filesystem() {
        let s = setup(true);
        write_aged(&s.watch.join("report.pdf"), "pdf", Duration::from_secs(60));
        write_aged(&s.watch.join("fresh.txt"), "txt", Duration::ZERO);

        let plan = s.organizer.plan(None);

        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].category, "Documents");
        assert_eq!(
            plan.moves[0].destination,
            s.root.join("Documents").join("report.pdf")
        );
        assert_eq!(plan.skipped.len(), 1);
        assert!(s.watch.join("report.pdf").exists());
        assert!(!s.root.exists());
    }

    #[test]
    fn test_directory_stats_counts_files() {
        let s = setup(false);
        let docs = s.root.join("Documents");
        fs::create_dir_all(&docs).unwrap();
        write_aged(&docs.join("a.pdf"), &"x".repeat(1024 * 1024), Duration::from_secs(600));
        write_aged(&docs.join("b.pdf"), "small", Duration::from_secs(60));
        fs::create_dir(docs.join("nested")).unwrap();

        let stats = s.organizer.directory_stats();

        let documents = &stats["Documents"];
        assert_eq!(documents.file_count, 2);
        assert_eq!(documents.total_size_mb, 1.0);
        let newest = fs::metadata(docs.join("b.pdf")).unwrap().modified().unwrap();
        assert_eq!(documents.last_modified, Some(DateTime::<Local>::from(newest)));

        assert_eq!(stats["Text"], DirectoryStats::empty());
        assert_eq!(stats["Other"], DirectoryStats::empty());
    }

    #[test]
    fn test_clean_empty_directories() {
        let s = setup(false);
        fs::create_dir_all(s.root.join("Documents")).unwrap();
        fs::create_dir_all(s.root.join("Text")).unwrap();
        fs::write(s.root.join("Text").join("keep.txt"), "keep").unwrap();

        assert_eq!(s.organizer.clean_empty_directories(), 1);
        assert!(!s.root.join("Documents").exists());
        assert!(s.root.join("Text").join("keep.txt").exists());
    }

    #[test]
    fn test_clean_missing_root_is_zero() {
        let s = setup(false);
        assert_eq!(s.organizer.clean_empty_directories(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = OrganizerConfig::with_root("/tmp/x");
        config.exclude.regex = vec!["(".to_string()];
        assert!(Organizer::new(config).is_err());
    }
}
