//! tidydesk - keep download and desktop folders tidy
//!
//! This library scans watch directories, holds back files that still look
//! in use, sorts the rest into per-category folders by extension (taking a
//! dated backup first when enabled), and reports what happened as plain data.

pub mod backup;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod naming;
pub mod organizer;
pub mod output;
pub mod safety;
pub mod scanner;
pub mod stats;

pub use backup::BackupManager;
pub use config::{CategoryRule, ConfigError, ExcludeRules, OrganizerConfig};
pub use file_category::CategoryTable;
pub use file_organizer::{MoveRecord, Mover, OrganizeError, RunCounters};
pub use organizer::{FileProgress, Organizer};
pub use safety::{SafetyClassifier, Verdict};
pub use scanner::{ScanFilter, Scanner};
pub use stats::{DirectoryStats, OrganizePlan, PlannedMove, RunStats};

pub use cli::{Cli, OrganizeCommand, run_cli};
