//! Heuristic check for whether a file is safe to relocate.
//!
//! A file is held back when it is still growing, was modified too recently,
//! or cannot be opened for reading. These are polling heuristics: a writer can
//! still touch the file between the last check and the move. They reduce the
//! chance of relocating a half-written download; they do not rule it out.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, SystemTime};

/// Why a file was judged unsafe, or that it was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    /// Size changed across the settle interval.
    Growing { before: u64, after: u64 },
    /// Modified less than the minimum age ago.
    TooFresh { age: Duration },
    /// Opening for read was refused.
    Locked,
    /// Some other I/O error made the file's state unknowable.
    Unverifiable,
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Safe => write!(f, "safe"),
            Verdict::Growing { before, after } => {
                write!(f, "still growing ({before} -> {after} bytes)")
            }
            Verdict::TooFresh { age } => write!(f, "modified {:.1}s ago", age.as_secs_f64()),
            Verdict::Locked => write!(f, "locked by another process"),
            Verdict::Unverifiable => write!(f, "state could not be verified"),
        }
    }
}

/// Gates files on size stability, age and readability.
#[derive(Debug, Clone, Copy)]
pub struct SafetyClassifier {
    settle_interval: Duration,
    min_age: Duration,
}

impl SafetyClassifier {
    pub fn new(settle_interval: Duration, min_age: Duration) -> Self {
        Self {
            settle_interval,
            min_age,
        }
    }

    /// Returns true only when every check passes. Never fails; errors mean unsafe.
    pub fn is_safe_to_move(&self, path: &Path) -> bool {
        self.assess(path).is_safe()
    }

    /// Runs the checks in order, stopping at the first that fails.
    ///
    /// Metadata is re-read for every sample so a stale size or time is never reused.
    pub fn assess(&self, path: &Path) -> Verdict {
        match self.try_assess(path) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Safety check failed");
                Verdict::Unverifiable
            }
        }
    }

    fn try_assess(&self, path: &Path) -> io::Result<Verdict> {
        let before = fs::metadata(path)?.len();
        if !self.settle_interval.is_zero() {
            thread::sleep(self.settle_interval);
        }
        let metadata = fs::metadata(path)?;
        let after = metadata.len();
        if before != after {
            return Ok(Verdict::Growing { before, after });
        }

        let modified = metadata.modified()?;
        // A modification time in the future counts as age zero.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age < self.min_age {
            return Ok(Verdict::TooFresh { age });
        }

        match File::open(path) {
            Ok(_) => Ok(Verdict::Safe),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(Verdict::Locked),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_old_stable_file_is_safe() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("report.pdf");
        fs::write(&path, "content").unwrap();
        age_file(&path, Duration::from_secs(60));

        let classifier = SafetyClassifier::new(Duration::from_millis(5), Duration::from_secs(30));
        assert_eq!(classifier.assess(&path), Verdict::Safe);
        assert!(classifier.is_safe_to_move(&path));
    }

    #[test]
    fn test_fresh_file_is_unsafe() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("partial.zip");
        fs::write(&path, "content").unwrap();
        age_file(&path, Duration::from_secs(2));

        let classifier = SafetyClassifier::new(Duration::ZERO, Duration::from_secs(30));
        assert!(matches!(classifier.assess(&path), Verdict::TooFresh { .. }));
        assert!(!classifier.is_safe_to_move(&path));
    }

    #[test]
    fn test_growing_file_is_unsafe() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("download.iso");
        fs::write(&path, "start").unwrap();
        age_file(&path, Duration::from_secs(60));

        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut file = File::options().append(true).open(writer_path).unwrap();
            file.write_all(b" more bytes").unwrap();
        });

        let classifier = SafetyClassifier::new(Duration::from_millis(400), Duration::ZERO);
        let verdict = classifier.assess(&path);
        writer.join().unwrap();

        assert_eq!(verdict, Verdict::Growing { before: 5, after: 16 });
    }

    #[test]
    fn test_missing_file_fails_closed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let classifier = SafetyClassifier::new(Duration::ZERO, Duration::ZERO);
        let verdict = classifier.assess(&temp_dir.path().join("gone.txt"));
        assert_eq!(verdict, Verdict::Unverifiable);
    }

    #[test]
    fn test_future_mtime_counts_as_fresh() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("skewed.txt");
        fs::write(&path, "x").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(3600))
            .unwrap();

        let classifier = SafetyClassifier::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(
            classifier.assess(&path),
            Verdict::TooFresh { age: Duration::ZERO }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_locked() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("secret.db");
        fs::write(&path, "x").unwrap();
        age_file(&path, Duration::from_secs(60));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass permission bits; nothing to observe then.
        if File::open(&path).is_ok() {
            return;
        }

        let classifier = SafetyClassifier::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(classifier.assess(&path), Verdict::Locked);
    }
}
