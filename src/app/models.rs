//! Data models for the MonRaS import pipeline.
//!
//! This module contains the cell value representation shared between the
//! workbook reader and the SQLite loader, the physical storage types, and
//! the diagnostics record types collected over a run.

use crate::config::DateStorageMode;
use chrono::NaiveDateTime;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::ToSql;
use std::fmt;
use std::time::Duration;

/// A single spreadsheet cell after reading, before storage typing.
///
/// `DateTime` only appears for cells calamine already decoded as native
/// spreadsheet datetimes; text that merely looks like a date stays `Text`
/// until the datetime normalizer handles it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Numeric view of the cell, used by the serial-date fallback and the
    /// overflow guard. Text is included because exports sometimes carry
    /// numbers as strings.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Real(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whether the cell carries no information (null, or whitespace-only
    /// text). Rows whose cells are all blank are dropped before loading.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Full display form of the cell.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Real(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Short display form used in problem records.
    pub fn display_snippet(&self, max_len: usize) -> String {
        truncate_chars(&self.to_display_string(), max_len)
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            CellValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            CellValue::Text(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            // SQLite has no boolean affinity; store as 0/1.
            CellValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            CellValue::DateTime(dt) => {
                ToSqlOutput::Owned(Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            }
        })
    }
}

/// Truncate to a maximum number of characters. The ellipsis marker counts
/// against the limit, so the result never exceeds `max_len` characters.
pub fn truncate_chars(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Physical SQLite column types emitted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Integer,
    Real,
    Text,
}

impl StorageType {
    /// SQL type keyword for CREATE TABLE statements.
    pub fn as_sql_str(&self) -> &'static str {
        match self {
            StorageType::Integer => "INTEGER",
            StorageType::Real => "REAL",
            StorageType::Text => "TEXT",
        }
    }

    /// Map a configured logical type name to its physical type.
    ///
    /// `DATETIME` depends on the storage mode: TEXT under `iso_text`,
    /// INTEGER under `unix_ms`. `BOOLEAN` is stored as INTEGER 0/1.
    /// Returns `None` for unrecognized names.
    pub fn from_logical(name: &str, mode: DateStorageMode) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" => Some(StorageType::Integer),
            "REAL" | "FLOAT" | "DOUBLE" => Some(StorageType::Real),
            "TEXT" | "STRING" => Some(StorageType::Text),
            "BOOLEAN" | "BOOL" => Some(StorageType::Integer),
            "DATETIME" | "TIMESTAMP" => Some(match mode {
                DateStorageMode::IsoText => StorageType::Text,
                DateStorageMode::UnixMs => StorageType::Integer,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql_str())
    }
}

/// Ordered column list of one destination table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<(String, StorageType)>,
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(c, _)| c == name)
    }
}

/// Categories of recoverable anomalies collected during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProblemKind {
    HeaderNotFound,
    DatetimeError,
    ValueOverflow,
    ExtremeValue,
    ParseError,
    GeneralError,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProblemKind::HeaderNotFound => "HEADER_NOT_FOUND",
            ProblemKind::DatetimeError => "DATETIME_ERROR",
            ProblemKind::ValueOverflow => "VALUE_OVERFLOW",
            ProblemKind::ExtremeValue => "EXTREME_VALUE",
            ProblemKind::ParseError => "PARSE_ERROR",
            ProblemKind::GeneralError => "GENERAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One recorded anomaly, tied to its source location as precisely as the
/// pipeline stage that raised it allows.
#[derive(Debug, Clone)]
pub struct ProblemRecord {
    /// Source file basename.
    pub file: String,
    /// Sheet name, empty when not applicable.
    pub sheet: String,
    /// Final column name, empty when not applicable.
    pub column: String,
    /// 1-based Excel row number, when the anomaly is tied to a row.
    pub row: Option<u32>,
    /// Snapshot of the offending value, truncated.
    pub value: String,
    pub kind: ProblemKind,
    pub message: String,
}

/// Aggregate statistics over one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportRunStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub tables_written: usize,
    pub total_rows: usize,
    pub processing_time: Duration,
}
