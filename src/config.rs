//! Configuration management and validation.
//!
//! The whole run is driven by one TOML document loaded once at startup.
//! The resulting [`ImportConfig`] is immutable for the duration of the run;
//! re-reading the document means constructing a new value and starting a
//! new run.

use crate::app::models::StorageType;
use crate::error::EtlError;
use crate::Result;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration for one import run.
///
/// Paths inside the document (`input.roots`, `output.sqlite_path`) are
/// resolved relative to the directory the document was loaded from.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub excel: ExcelConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub sqlite: SqliteConfig,

    /// Directory the configuration document was loaded from, used to
    /// resolve relative paths. Not part of the document itself.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Input roots and file matching.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Root directories searched for spreadsheet files.
    pub roots: Vec<PathBuf>,

    /// Glob pattern applied to file names under each root.
    #[serde(default = "default_glob")]
    pub glob: String,

    /// Whether to descend into subdirectories of each root.
    #[serde(default)]
    pub recursive: bool,
}

/// Header detection thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcelConfig {
    /// How many leading rows of each sheet are scanned for the header.
    #[serde(default = "default_max_header_scan_rows")]
    pub max_header_scan_rows: u32,

    #[serde(default)]
    pub header_match: HeaderMatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderMatchConfig {
    /// Minimum number of cells matching an anchor phrase.
    #[serde(default = "default_min_hits")]
    pub min_hits: usize,

    /// Minimum ratio of matching cells among non-blank cells.
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
}

/// Column renaming and typing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Source header (in any normalization state) to target column name.
    #[serde(default)]
    pub column_aliases: BTreeMap<String, String>,

    /// Logical type name to list of target column names.
    ///
    /// Recognized logical types: `integer`, `real`, `text`, `datetime`,
    /// `boolean`. Columns not listed anywhere receive `fallback_type`.
    #[serde(default)]
    pub column_types: BTreeMap<String, Vec<String>>,

    /// Physical type for columns absent from `column_types`.
    #[serde(default = "default_fallback_type")]
    pub fallback_type: String,

    /// Maximum length of a slugified column identifier.
    #[serde(default = "default_max_identifier_len")]
    pub max_identifier_len: usize,

    #[serde(default)]
    pub datetime: DatetimeConfig,
}

/// Datetime column detection and storage encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatetimeConfig {
    /// Case-insensitive regex matched against normalized column names to
    /// detect datetime columns.
    #[serde(default = "default_detect_regex")]
    pub detect_regex: String,

    /// Case-insensitive regex marking datetime columns that carry
    /// UTC instants; all other datetime columns are naive local time.
    #[serde(default = "default_utc_regex")]
    pub utc_regex: String,

    /// How datetime values are physically stored.
    #[serde(default)]
    pub store_as: DateStorageMode,

    /// chrono format string for naive datetime columns under `iso_text`.
    #[serde(default = "default_iso_format_naive")]
    pub iso_format_naive: String,

    /// chrono format string for UTC datetime columns under `iso_text`.
    #[serde(default = "default_iso_format_utc")]
    pub iso_format_utc: String,
}

/// Physical storage encodings for datetime columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStorageMode {
    /// ISO-8601 TEXT, formatted per `iso_format_naive` / `iso_format_utc`.
    #[default]
    IsoText,
    /// INTEGER milliseconds since 1970-01-01T00:00:00 UTC.
    UnixMs,
}

/// Table naming rules applied to source filenames.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Strip trailing and embedded 4-digit years (19xx/20xx).
    #[serde(default = "default_true")]
    pub drop_years: bool,

    /// Strip a trailing version suffix such as `_2`, `(2)`, `-2`.
    #[serde(default = "default_true")]
    pub drop_trailing_version_suffix: bool,

    /// Keep at most this many leading words of the stripped name.
    #[serde(default = "default_keep_max_words")]
    pub keep_max_words: usize,

    /// Maximum length of the final table identifier.
    #[serde(default = "default_table_max_len")]
    pub max_len: usize,
}

/// Destination database settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Path of the destination SQLite database file.
    pub sqlite_path: PathBuf,

    /// Policy when a destination table already exists.
    #[serde(default)]
    pub if_exists: IfExists,
}

/// Policy for pre-existing destination tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    /// Drop and recreate the table.
    #[default]
    Replace,
    /// Keep the table and append rows; the resolved columns must all
    /// exist in it already.
    Append,
    /// Abort the entire run if the table exists. Checked before any
    /// workbook I/O for the file.
    Fail,
}

/// SQLite write tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Requested rows per insert chunk; the effective size is additionally
    /// bounded by the bind-variable ceiling.
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: usize,

    /// Whether to create the configured indexes after loading.
    #[serde(default = "default_true")]
    pub create_indexes: bool,

    /// Index specifications: each entry is the column list of one index.
    /// Specs naming any column absent from the final schema are skipped.
    #[serde(default)]
    pub indexes: Vec<Vec<String>>,

    /// PRAGMA key/value pairs applied when the database is opened.
    #[serde(default)]
    pub pragmas: BTreeMap<String, String>,
}

fn default_glob() -> String {
    "*.xlsx".to_string()
}

fn default_max_header_scan_rows() -> u32 {
    40
}

fn default_min_hits() -> usize {
    5
}

fn default_min_ratio() -> f64 {
    0.5
}

fn default_fallback_type() -> String {
    "TEXT".to_string()
}

fn default_max_identifier_len() -> usize {
    64
}

fn default_detect_regex() -> String {
    "datum|čas|date|time".to_string()
}

fn default_utc_regex() -> String {
    "utc".to_string()
}

fn default_iso_format_naive() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_iso_format_utc() -> String {
    "%Y-%m-%dT%H:%M:%SZ".to_string()
}

fn default_keep_max_words() -> usize {
    4
}

fn default_table_max_len() -> usize {
    48
}

fn default_chunk_rows() -> usize {
    500
}

fn default_true() -> bool {
    true
}

impl Default for ExcelConfig {
    fn default() -> Self {
        Self {
            max_header_scan_rows: default_max_header_scan_rows(),
            header_match: HeaderMatchConfig::default(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            column_aliases: BTreeMap::new(),
            column_types: BTreeMap::new(),
            fallback_type: default_fallback_type(),
            max_identifier_len: default_max_identifier_len(),
            datetime: DatetimeConfig::default(),
        }
    }
}

impl Default for HeaderMatchConfig {
    fn default() -> Self {
        Self {
            min_hits: default_min_hits(),
            min_ratio: default_min_ratio(),
        }
    }
}

impl Default for DatetimeConfig {
    fn default() -> Self {
        Self {
            detect_regex: default_detect_regex(),
            utc_regex: default_utc_regex(),
            store_as: DateStorageMode::default(),
            iso_format_naive: default_iso_format_naive(),
            iso_format_utc: default_iso_format_utc(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            drop_years: true,
            drop_trailing_version_suffix: true,
            keep_max_words: default_keep_max_words(),
            max_len: default_table_max_len(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            chunk_rows: default_chunk_rows(),
            create_indexes: true,
            indexes: Vec::new(),
            pragmas: BTreeMap::new(),
        }
    }
}

impl ImportConfig {
    /// Load the configuration document from `path`.
    ///
    /// An unparsable document, an unknown `if_exists` value or an unknown
    /// field all fail here, before any file is touched.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EtlError::configuration(format!(
                "Cannot read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config: ImportConfig = toml::from_str(&contents).map_err(|e| {
            EtlError::configuration(format!("Invalid config file '{}': {}", path.display(), e))
        })?;

        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Default location of the configuration document:
    /// `~/.config/monras-etl/config.toml`.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EtlError::configuration("Cannot determine user config directory"))?;
        Ok(config_dir.join("monras-etl").join("config.toml"))
    }

    /// Absolute path of the destination database.
    pub fn db_path(&self) -> PathBuf {
        resolve_path(&self.base_dir, &self.output.sqlite_path)
    }

    /// Absolute paths of the input roots.
    pub fn input_roots(&self) -> Vec<PathBuf> {
        self.input
            .roots
            .iter()
            .map(|root| resolve_path(&self.base_dir, root))
            .collect()
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.input.roots.is_empty() {
            return Err(EtlError::configuration("input.roots must not be empty"));
        }
        if self.excel.max_header_scan_rows == 0 {
            return Err(EtlError::configuration(
                "excel.max_header_scan_rows must be at least 1",
            ));
        }
        if self.excel.header_match.min_hits == 0 {
            return Err(EtlError::configuration(
                "excel.header_match.min_hits must be at least 1",
            ));
        }
        let ratio = self.excel.header_match.min_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(EtlError::configuration(
                "excel.header_match.min_ratio must lie in [0, 1]",
            ));
        }
        if self.sqlite.chunk_rows == 0 {
            return Err(EtlError::configuration(
                "sqlite.chunk_rows must be at least 1",
            ));
        }
        if self.schema.max_identifier_len == 0 || self.naming.max_len == 0 {
            return Err(EtlError::configuration(
                "identifier length limits must be at least 1",
            ));
        }

        // Regexes must compile before the run starts.
        compile_ci_regex(&self.schema.datetime.detect_regex).map_err(|e| {
            EtlError::configuration(format!("schema.datetime.detect_regex: {}", e))
        })?;
        compile_ci_regex(&self.schema.datetime.utc_regex)
            .map_err(|e| EtlError::configuration(format!("schema.datetime.utc_regex: {}", e)))?;

        // Every logical type name must be known; the dashboard contract
        // promises INTEGER/REAL/TEXT physical typing only.
        for logical in self.schema.column_types.keys() {
            StorageType::from_logical(logical, self.schema.datetime.store_as).ok_or_else(|| {
                EtlError::configuration(format!(
                    "schema.column_types: unknown logical type '{}'",
                    logical
                ))
            })?;
        }
        StorageType::from_logical(&self.schema.fallback_type, self.schema.datetime.store_as)
            .ok_or_else(|| {
                EtlError::configuration(format!(
                    "schema.fallback_type: unknown type '{}'",
                    self.schema.fallback_type
                ))
            })?;

        Ok(())
    }
}

/// Compile a configured pattern case-insensitively.
pub fn compile_ci_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
