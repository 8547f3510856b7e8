//! Command-line argument definitions for the MonRaS importer.
//!
//! The CLI interface is defined with the clap derive API. The pipeline's
//! real contract is the configuration document; the flags here only say
//! where that document lives and how chatty the run should be.

use crate::error::EtlError;
use crate::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the MonRaS spreadsheet importer
///
/// Imports heterogeneous XLSX exports from the MonRaS radiation monitoring
/// network into a single normalized SQLite database.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "monras-etl",
    version,
    about = "Import MonRaS XLSX exports into a normalized SQLite database",
    long_about = "Batch importer for MonRaS radiation monitoring exports. Locates the data \
                  region inside arbitrarily-shaped workbooks, normalizes headers into stable \
                  SQLite identifiers, repairs corrupted datetimes, and loads everything into \
                  one database with a diagnostics report for every recovered anomaly."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the full XLSX to SQLite import (default command)
    Import(ImportArgs),
    /// Inspect an existing destination database
    Analyze(AnalyzeArgs),
}

/// Arguments for the import command
#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// Path to the configuration document
    ///
    /// TOML file describing input roots, schema rules and the destination
    /// database. If not specified, looks for
    /// ~/.config/monras-etl/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the analyze command
#[derive(Debug, Clone, Parser)]
pub struct AnalyzeArgs {
    /// Path to the configuration document, used to locate the database
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Database file to analyze
    ///
    /// Overrides the destination path from the configuration document.
    #[arg(
        short = 'd',
        long = "database",
        value_name = "FILE",
        help = "SQLite database to analyze"
    )]
    pub database: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Option<Commands> {
        self.command.clone()
    }
}

impl ImportArgs {
    /// Validate the import command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(EtlError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if progress output should be shown (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl AnalyzeArgs {
    /// Validate the analyze command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(EtlError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        if let Some(database) = &self.database {
            if !database.exists() {
                return Err(EtlError::configuration(format!(
                    "Database does not exist: {}",
                    database.display()
                )));
            }
        }
        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
