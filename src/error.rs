//! Error handling for the import pipeline.
//!
//! Distinguishes run-level aborts (configuration preconditions) from
//! per-file failures that the run loop recovers from and records as
//! diagnostics.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("No sheet in '{path}' contains a row matching the expected header")]
    HeaderNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Table '{table}' already exists and if_exists=fail")]
    TableExists { table: String },

    #[error(
        "Cannot append to table '{table}': column '{column}' is missing from the existing schema"
    )]
    SchemaMismatch { table: String, column: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl EtlError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a workbook read error
    pub fn workbook(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Workbook {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run instead of being recorded
    /// against a single file and recovered from.
    ///
    /// Only configuration preconditions qualify: an invalid configuration
    /// document, or `if_exists=fail` against an existing table. Everything
    /// else is caught at the file boundary.
    pub fn is_run_abort(&self) -> bool {
        matches!(
            self,
            EtlError::Configuration { .. } | EtlError::TableExists { .. }
        )
    }
}
