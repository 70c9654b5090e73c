//! Organizer configuration.
//!
//! All inputs of an organizer run live in one [`OrganizerConfig`] value that
//! callers construct (or load) and pass to [`Organizer::new`](crate::Organizer::new).
//! There is no process-wide settings object.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. Every key is optional:
//!
//! ```toml
//! watch_directories = ["/home/me/Downloads", "/home/me/Desktop"]
//! organized_root = "/home/me/Organized"
//! backup_root = "/home/me/.local/share/tidydesk/backups"
//! backup_enabled = true
//! fallback_category = "other"
//! settle_interval_ms = 1000
//! min_age_secs = 30
//!
//! [[categories]]
//! name = "images"
//! extensions = ["jpg", "png"]
//!
//! [exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["part", "crdownload"]
//! patterns = ["*.tmp"]
//! regex = []
//! ```
//!
//! When `categories` is present it replaces the built-in table entirely.

use crate::file_category::CategoryTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Category that unmatched extensions resolve to.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "other";
/// Default wait between the two size samples of the growing-file check.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(1000);
/// Default minimum age since last modification before a file may be moved.
pub const DEFAULT_MIN_AGE: Duration = Duration::from_secs(30);

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".tidydeskrc.toml";
/// Environment variable holding extra, comma-separated watch directories.
pub const ENV_WATCH_DIRS: &str = "TIDYDESK_WATCH_DIRS";
/// Environment variable overriding `backup_enabled`.
pub const ENV_BACKUP: &str = "TIDYDESK_BACKUP";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("organized files root must not be empty")]
    EmptyOrganizedRoot,

    #[error("backup root must not be empty when backups are enabled")]
    EmptyBackupRoot,

    #[error("invalid category name {0:?}: must be a single directory name")]
    InvalidCategoryName(String),

    #[error("category {category:?} lists an empty extension")]
    EmptyExtension { category: String },

    #[error("extension {extension:?} is mapped to both {first:?} and {second:?}")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },

    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("invalid value {value:?} for {name}: expected true or false")]
    InvalidEnvValue { name: &'static str, value: String },
}

/// One row of the category table: a category name and the extensions it claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl CategoryRule {
    fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// The built-in category table.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("images", &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg"]),
            Self::new("documents", &["pdf", "doc", "docx", "txt", "rtf", "odt"]),
            Self::new("spreadsheets", &["xls", "xlsx", "csv", "ods"]),
            Self::new("presentations", &["ppt", "pptx", "odp"]),
            Self::new("archives", &["zip", "rar", "7z", "tar", "gz"]),
            Self::new("executables", &["exe", "msi", "dmg", "pkg", "deb", "rpm"]),
            Self::new("videos", &["mp4", "avi", "mkv", "mov", "wmv", "flv"]),
            Self::new("audio", &["mp3", "wav", "flac", "aac", "ogg"]),
            Self::new("code", &["py", "js", "html", "css", "cpp", "java", "c"]),
        ]
    }
}

/// Rules for excluding files from scanning, applied after the hidden-file rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names to skip (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions to skip, case-insensitive (e.g., "part", "crdownload").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Everything an [`Organizer`](crate::Organizer) needs, read once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub watch_directories: Vec<PathBuf>,
    pub organized_root: PathBuf,
    pub backup_root: PathBuf,
    pub backup_enabled: bool,
    pub fallback_category: String,
    #[serde(rename = "settle_interval_ms", with = "duration_ms")]
    pub settle_interval: Duration,
    #[serde(rename = "min_age_secs", with = "duration_secs")]
    pub min_age: Duration,
    pub categories: Vec<CategoryRule>,
    pub exclude: ExcludeRules,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        let home = home_dir();
        let data_dir = home.join(".local").join("share").join("tidydesk");
        Self {
            watch_directories: vec![home.join("Downloads"), home.join("Desktop")],
            organized_root: data_dir.join("organized_files"),
            backup_root: data_dir.join("backups"),
            backup_enabled: true,
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            min_age: DEFAULT_MIN_AGE,
            categories: CategoryRule::defaults(),
            exclude: ExcludeRules::default(),
        }
    }
}

impl OrganizerConfig {
    /// Creates a configuration rooted at `organized_root`, with backups under
    /// `<organized_root>/.backups` and no watch directories.
    ///
    /// Convenient for embedding and tests; everything else keeps its default.
    pub fn with_root(organized_root: impl Into<PathBuf>) -> Self {
        let organized_root = organized_root.into();
        Self {
            watch_directories: Vec::new(),
            backup_root: organized_root.join(".backups"),
            organized_root,
            ..Self::default()
        }
    }

    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tidydeskrc.toml` in the current directory
    /// 3. Look for `~/.config/tidydesk/config.toml` in the home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        let home_config = home_dir()
            .join(".config")
            .join("tidydesk")
            .join("config.toml");
        if home_config.exists() {
            return Self::load_from_file(&home_config);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Applies the values of `TIDYDESK_WATCH_DIRS` and `TIDYDESK_BACKUP`.
    ///
    /// Watch directories are appended; the backup value must be a boolean word.
    pub fn apply_overrides(
        &mut self,
        watch_dirs: Option<&str>,
        backup: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(dirs) = watch_dirs {
            self.watch_directories.extend(
                dirs.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from),
            );
        }

        if let Some(value) = backup {
            self.backup_enabled = match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnvValue {
                        name: ENV_BACKUP,
                        value: value.to_string(),
                    });
                }
            };
        }

        Ok(())
    }

    /// Checks the configuration and builds its category table.
    ///
    /// # Errors
    ///
    /// Returns the first contract violation found: an empty organized root, an empty
    /// backup root while backups are enabled, or an invalid category table.
    pub fn validate(&self) -> Result<CategoryTable, ConfigError> {
        if self.organized_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOrganizedRoot);
        }
        if self.backup_enabled && self.backup_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBackupRoot);
        }
        CategoryTable::new(&self.categories, &self.fallback_category)
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OrganizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_category, "other");
        assert_eq!(config.settle_interval, DEFAULT_SETTLE_INTERVAL);
        assert_eq!(config.min_age, DEFAULT_MIN_AGE);
        assert!(config.backup_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = OrganizerConfig::from_toml(
            r#"
            organized_root = "/srv/sorted"
            backup_enabled = false
            min_age_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.organized_root, PathBuf::from("/srv/sorted"));
        assert!(!config.backup_enabled);
        assert_eq!(config.min_age, Duration::from_secs(5));
        assert_eq!(config.settle_interval, DEFAULT_SETTLE_INTERVAL);
        assert_eq!(config.categories, CategoryRule::defaults());
    }

    #[test]
    fn test_categories_keep_declaration_order() {
        let config = OrganizerConfig::from_toml(
            r#"
            fallback_category = "Other"

            [[categories]]
            name = "Text"
            extensions = [".txt", "md"]

            [[categories]]
            name = "Documents"
            extensions = ["pdf"]

            [exclude]
            extensions = ["part"]
            "#,
        )
        .unwrap();

        let names: Vec<_> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Text", "Documents"]);
        assert_eq!(config.exclude.extensions, vec!["part".to_string()]);

        let table = config.validate().unwrap();
        assert_eq!(table.known_categories(), vec!["Text", "Documents", "Other"]);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = OrganizerConfig::from_toml("settle_interval_ms = \"soon\"");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = OrganizerConfig::load(Some(Path::new("/non/existent/tidydesk.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "settle_interval_ms = 250\n").unwrap();

        let config = OrganizerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.settle_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_toml_round_trip_preserves_settings() {
        let mut config = OrganizerConfig::with_root("/tmp/sorted");
        config.min_age = Duration::from_secs(90);
        let text = config.to_toml().unwrap();
        let parsed = OrganizerConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_overrides_extend_watch_dirs_and_toggle_backup() {
        let mut config = OrganizerConfig::with_root("/tmp/sorted");
        config
            .apply_overrides(Some("/a, /b ,,"), Some("false"))
            .unwrap();
        assert_eq!(
            config.watch_directories,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(!config.backup_enabled);

        let err = config.apply_overrides(None, Some("maybe"));
        assert!(matches!(err, Err(ConfigError::InvalidEnvValue { .. })));
    }

    #[test]
    fn test_validate_rejects_contract_violations() {
        let mut config = OrganizerConfig::with_root("");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyOrganizedRoot)
        ));

        config.organized_root = PathBuf::from("/tmp/sorted");
        config.backup_root = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyBackupRoot)));

        config.backup_enabled = false;
        assert!(config.validate().is_ok());

        config.categories.push(CategoryRule::new("duplicates", &["PDF"]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateExtension { .. })
        ));
    }
}
