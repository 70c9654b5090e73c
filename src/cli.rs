//! Command-line interface module for tidydesk.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Building the organizer configuration from file, environment and flags
//! - Dispatching to organize, dry-run, scan, stats and clean operations
//! - Rendering results as colored text or JSON

use crate::config::{ConfigError, ENV_BACKUP, ENV_WATCH_DIRS, OrganizerConfig};
use crate::organizer::Organizer;
use crate::output::OutputFormatter;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Organize loose files into category folders.
#[derive(Debug, Parser)]
#[command(name = "tidydesk", version, about)]
pub struct Cli {
    /// Configuration file (defaults: ./.tidydeskrc.toml, ~/.config/tidydesk/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Organized-files root, overriding the configuration
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log level or filter directive (overridden by TIDYDESK_LOG)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: OrganizeCommand,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum OrganizeCommand {
    /// Move safe files from the watch directories into category folders
    Organize {
        /// Directories to organize instead of the configured watch directories
        dirs: Vec<PathBuf>,

        /// Show what would be moved without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the backup copy for this run
        #[arg(long)]
        no_backup: bool,

        /// Minimum file age in seconds
        #[arg(long)]
        min_age_secs: Option<u64>,

        /// Wait between size samples in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,
    },
    /// List candidate files without checking or moving them
    Scan {
        /// Directories to scan instead of the configured watch directories
        dirs: Vec<PathBuf>,
    },
    /// Show file counts and sizes per category folder
    Stats,
    /// Remove empty category folders
    Clean,
    /// Print the effective configuration as TOML
    Config,
}

/// Errors surfaced to the user by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads configuration and applies environment and command-line overrides.
pub fn build_config(cli: &Cli) -> Result<OrganizerConfig, CliError> {
    build_config_with_env(
        cli,
        std::env::var(ENV_WATCH_DIRS).ok().as_deref(),
        std::env::var(ENV_BACKUP).ok().as_deref(),
    )
}

/// [`build_config`] with the environment values passed in. Command-line flags win over both.
pub fn build_config_with_env(
    cli: &Cli,
    watch_dirs: Option<&str>,
    backup: Option<&str>,
) -> Result<OrganizerConfig, CliError> {
    let mut config = OrganizerConfig::load(cli.config.as_deref())?;
    config.apply_overrides(watch_dirs, backup)?;

    if let Some(root) = &cli.root {
        config.organized_root = root.clone();
    }

    if let OrganizeCommand::Organize {
        no_backup,
        min_age_secs,
        settle_ms,
        ..
    } = &cli.command
    {
        if *no_backup {
            config.backup_enabled = false;
        }
        if let Some(secs) = min_age_secs {
            config.min_age = Duration::from_secs(*secs);
        }
        if let Some(ms) = settle_ms {
            config.settle_interval = Duration::from_millis(*ms);
        }
    }

    Ok(config)
}

/// Runs the parsed command line with a configuration loaded from disk.
pub fn run_cli(cli: &Cli) -> Result<(), CliError> {
    let config = build_config(cli)?;
    run_cli_with_config(&cli.command, config, cli.json)
}

/// Runs a command against an explicit configuration.
pub fn run_cli_with_config(
    command: &OrganizeCommand,
    config: OrganizerConfig,
    json: bool,
) -> Result<(), CliError> {
    let mut organizer = Organizer::new(config)?;

    match command {
        OrganizeCommand::Organize { dirs, dry_run, .. } => {
            let files = if dirs.is_empty() {
                organizer.scan()
            } else {
                organizer.scan_directories(dirs.as_slice())
            };

            if *dry_run {
                let plan = organizer.plan(Some(files.as_slice()));
                if json {
                    print_json(&plan)?;
                } else {
                    OutputFormatter::plan(&plan);
                }
                return Ok(());
            }

            let stats = if json || files.is_empty() {
                organizer.organize_files(Some(files.as_slice()))
            } else {
                let pb = OutputFormatter::create_progress_bar(files.len() as u64);
                let stats = organizer.organize_files_with(Some(files.as_slice()), |progress| {
                    pb.set_position(progress.index as u64);
                    if let Some(name) = progress.path.file_name() {
                        pb.set_message(name.to_string_lossy().to_string());
                    }
                    ControlFlow::Continue(())
                });
                pb.finish_and_clear();
                stats
            };

            if json {
                print_json(&stats)?;
            } else if stats.considered() == 0 {
                OutputFormatter::info("No files found to organize.");
            } else {
                OutputFormatter::run_summary(&stats);
            }
        }
        OrganizeCommand::Scan { dirs } => {
            let files = if dirs.is_empty() {
                organizer.scan()
            } else {
                organizer.scan_directories(dirs.as_slice())
            };
            if json {
                print_json(&files)?;
            } else {
                for file in &files {
                    println!(
                        "{}  [{}]",
                        file.display(),
                        organizer.categories().categorize(file)
                    );
                }
                OutputFormatter::info(&format!("{} candidate file(s)", files.len()));
            }
        }
        OrganizeCommand::Stats => {
            let stats = organizer.directory_stats();
            if json {
                print_json(&stats)?;
            } else {
                OutputFormatter::directory_stats(&stats);
            }
        }
        OrganizeCommand::Clean => {
            let removed = organizer.clean_empty_directories();
            if json {
                print_json(&serde_json::json!({ "removed": removed }))?;
            } else {
                OutputFormatter::success(&format!("Removed {} empty director(ies)", removed));
            }
        }
        OrganizeCommand::Config => print!("{}", organizer.config().to_toml()?),
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
