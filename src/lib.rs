//! MonRaS ETL Library
//!
//! A Rust library for importing heterogeneous XLSX exports from the MonRaS
//! radiation monitoring network into a single normalized SQLite database.
//!
//! This library provides tools for:
//! - Locating the real data region inside arbitrarily-shaped workbooks
//! - Normalizing column headers into safe, unique SQLite identifiers
//! - Multi-strategy datetime parsing with repair of a recurring
//!   year-truncation corruption pattern
//! - Guarding fixed-width columns against numeric overflow
//! - Size-bounded batch persistence with per-file failure isolation
//! - Collecting and reporting every recoverable anomaly of a run

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod datetime;
        pub mod header_locator;
        pub mod normalize;
        pub mod problem_log;
        pub mod table_namer;
        pub mod type_resolver;
        pub mod value_guard;
    }
}

// Processing pipeline modules
pub mod processor;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{CellValue, ProblemKind, ProblemRecord, StorageType, TableSchema};
pub use config::ImportConfig;
pub use error::EtlError;

/// Result type alias for the MonRaS ETL pipeline
pub type Result<T> = std::result::Result<T, EtlError>;
