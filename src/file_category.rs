/// Extension-based categorization for organizing files.
///
/// This module maps file extensions to category names through an ordered,
/// immutable [`CategoryTable`]. Any extension that is not in the table resolves
/// to the table's fallback category.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tidydesk::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.categorize(Path::new("photo.JPG")), "images");
/// assert_eq!(table.categorize(Path::new("notes.txt")), "documents");
/// assert_eq!(table.categorize(Path::new("mystery.xyz")), "other");
/// ```
use crate::config::{CategoryRule, ConfigError, DEFAULT_FALLBACK_CATEGORY};
use std::collections::HashMap;
use std::path::Path;

/// Normalizes a configured extension: trims it, drops a leading dot and lowercases it.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Maps lowercase file extensions to category names.
///
/// Categories keep the order they were declared in. Every extension belongs
/// to at most one category; this is checked when the table is built.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<String>,
    extension_map: HashMap<String, usize>,
    fallback: String,
}

impl CategoryTable {
    /// Builds a table from ordered category rules.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a category name is not a valid single path
    /// component, when an extension is empty, or when the same extension is
    /// claimed by two categories.
    pub fn new(rules: &[CategoryRule], fallback: &str) -> Result<Self, ConfigError> {
        validate_category_name(fallback)?;

        let mut table = Self {
            categories: Vec::with_capacity(rules.len()),
            extension_map: HashMap::new(),
            fallback: fallback.to_string(),
        };

        for rule in rules {
            validate_category_name(&rule.name)?;
            let index = match table.categories.iter().position(|c| c == &rule.name) {
                Some(existing) => existing,
                None => {
                    table.categories.push(rule.name.clone());
                    table.categories.len() - 1
                }
            };

            for ext in &rule.extensions {
                let normalized = normalize_extension(ext);
                if normalized.is_empty() {
                    return Err(ConfigError::EmptyExtension {
                        category: rule.name.clone(),
                    });
                }
                if let Some(&owner) = table.extension_map.get(&normalized)
                    && owner != index
                {
                    return Err(ConfigError::DuplicateExtension {
                        extension: normalized,
                        first: table.categories[owner].clone(),
                        second: rule.name.clone(),
                    });
                }
                table.extension_map.insert(normalized, index);
            }
        }

        Ok(table)
    }

    /// Looks up the category for a bare extension (case-insensitive, dot optional).
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(|&index| self.categories[index].as_str())
    }

    /// Resolves the category for a file path.
    ///
    /// Only the last extension counts (`archive.tar.gz` resolves by `gz`).
    /// Files without an extension go to the fallback category. Never fails.
    pub fn categorize(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|ext| self.extension_to_category(&ext.to_string_lossy()))
            .unwrap_or(&self.fallback)
    }

    /// Returns the fallback category name.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Returns every known category in declaration order, followed by the
    /// fallback if it is not already declared.
    pub fn known_categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        if !names.contains(&self.fallback.as_str()) {
            names.push(&self.fallback);
        }
        names
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        // The built-in rules are known to be valid.
        let rules = CategoryRule::defaults();
        let mut table = Self {
            categories: Vec::new(),
            extension_map: HashMap::new(),
            fallback: DEFAULT_FALLBACK_CATEGORY.to_string(),
        };
        for (index, rule) in rules.into_iter().enumerate() {
            for ext in &rule.extensions {
                table.extension_map.insert(normalize_extension(ext), index);
            }
            table.categories.push(rule.name);
        }
        table
    }
}

/// Category names become directory names, so they must be a single normal path component.
fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(ConfigError::InvalidCategoryName(name.to_string()));
    }
    Ok(())
}
