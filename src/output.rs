//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the per-file progress bar, and the summary tables for runs, dry runs and
//! category directory statistics.

use crate::stats::{DirectoryStats, OrganizePlan, RunStats};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a batch of `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-category tally of a run and its totals.
    pub fn run_summary(stats: &RunStats) {
        Self::header("SUMMARY");

        let width = column_width(stats.categories.keys());
        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &stats.categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count)
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            stats.organized.to_string().green().bold(),
            plural(stats.organized)
        );

        if stats.skipped > 0 {
            Self::warning(&format!(
                "{} {} not ready to move (still being written or too recent)",
                stats.skipped,
                plural(stats.skipped)
            ));
        }
        if stats.errors > 0 {
            Self::error(&format!(
                "{} {} could not be organized; see log for details",
                stats.errors,
                plural(stats.errors)
            ));
        }
        if stats.cancelled {
            Self::warning("Run was cancelled before all files were processed");
        }
        Self::info(&format!(
            "Last run: {}",
            stats.last_run.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    /// Prints what a dry run would do.
    pub fn plan(plan: &OrganizePlan) {
        if plan.moves.is_empty() && plan.skipped.is_empty() {
            Self::info("No files found to organize.");
            return;
        }

        for planned in &plan.moves {
            println!(
                "{} {} → {}",
                "[DRY RUN]".yellow(),
                planned.source.display(),
                planned.destination.display()
            );
        }
        for (path, reason) in &plan.skipped {
            println!("{} {} ({})", "skip".dimmed(), path.display(), reason);
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for planned in &plan.moves {
            *counts.entry(planned.category.as_str()).or_insert(0) += 1;
        }

        Self::header("DRY RUN SUMMARY");
        for (category, count) in counts {
            println!("  {} {}: {}", category, plural(count), count);
        }
        Self::success("Dry run complete. No files were modified.");
    }

    /// Prints the per-category directory statistics.
    pub fn directory_stats(stats: &BTreeMap<String, DirectoryStats>) {
        Self::header("CATEGORY DIRECTORIES");

        let width = column_width(stats.keys());
        println!(
            "{:<width$} | {:>6} | {:>10} | {}",
            "Category".bold(),
            "Files".bold(),
            "Size (MB)".bold(),
            "Last modified".bold()
        );
        println!("{}", "-".repeat(width + 45));
        for (category, entry) in stats {
            let last_modified = entry
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<width$} | {:>6} | {:>10.2} | {}",
                category, entry.file_count, entry.total_size_mb, last_modified
            );
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn column_width<'a>(names: impl Iterator<Item = &'a String>) -> usize {
    names.map(|name| name.len()).max().unwrap_or(0).max(8)
}
