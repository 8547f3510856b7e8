//! Datetime normalization for detected datetime columns.
//!
//! Each cell of a datetime column runs through a fixed sequence: missing
//! tokens become null, a recurring year-truncation corruption is repaired
//! at the string level, textual parsing is attempted day-first and then
//! month-first, spreadsheet serial numbers fill in what text parsing could
//! not, a post-parse year correction catches the remaining misparses, and
//! the result is encoded for storage. Cells that survive all strategies
//! unparsed are reported to the caller so they can be logged and nulled.

pub mod parse;
pub mod repair;
pub mod storage;

use crate::app::models::CellValue;
use crate::config::{compile_ci_regex, DateStorageMode, DatetimeConfig};
use crate::constants::{MISSING_TOKENS, PLAUSIBLE_YEAR_MAX, PLAUSIBLE_YEAR_MIN};
use crate::Result;
use chrono::{Datelike, NaiveDateTime};
use regex::Regex;

/// Result of normalizing one cell of a datetime column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// The cell was null or a missing-value token.
    Null,
    /// The cell normalized to a storable value.
    Value(CellValue),
    /// No strategy produced a timestamp; carries a snapshot of the raw
    /// value for diagnostics. The destination cell becomes null.
    Failed(String),
}

/// Compiled datetime handling for one run.
pub struct DatetimeNormalizer {
    detect_re: Regex,
    utc_re: Regex,
    store_as: DateStorageMode,
    iso_format_naive: String,
    iso_format_utc: String,
}

impl DatetimeNormalizer {
    pub fn new(config: &DatetimeConfig) -> Result<Self> {
        Ok(Self {
            detect_re: compile_ci_regex(&config.detect_regex)?,
            utc_re: compile_ci_regex(&config.utc_regex)?,
            store_as: config.store_as,
            iso_format_naive: config.iso_format_naive.clone(),
            iso_format_utc: config.iso_format_utc.clone(),
        })
    }

    /// Whether a final column name denotes a datetime column.
    pub fn is_datetime_column(&self, column: &str) -> bool {
        self.detect_re.is_match(column)
    }

    /// Whether a datetime column carries UTC instants rather than naive
    /// local time.
    pub fn is_utc_column(&self, column: &str) -> bool {
        self.utc_re.is_match(column)
    }

    /// Physical storage type of datetime columns under the configured mode.
    pub fn storage_mode(&self) -> DateStorageMode {
        self.store_as
    }

    /// Normalize one cell of a datetime column.
    pub fn normalize_cell(&self, cell: &CellValue, utc: bool) -> CellOutcome {
        if is_missing(cell) {
            return CellOutcome::Null;
        }

        // Native spreadsheet datetimes skip text parsing entirely.
        let parsed: Option<NaiveDateTime> = match cell {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => {
                let repaired = repair::repair_year_truncation(s);
                parse::parse_text(&repaired)
                    .or_else(|| cell.numeric_value().and_then(parse::serial_to_datetime))
            }
            _ => cell.numeric_value().and_then(parse::serial_to_datetime),
        };

        let Some(dt) = parsed else {
            return CellOutcome::Failed(cell.to_display_string());
        };

        match sanitize_year(dt) {
            // Implausible beyond repair; dropped without a diagnostic.
            None => CellOutcome::Null,
            Some(dt) => CellOutcome::Value(storage::encode(
                dt,
                utc,
                self.store_as,
                &self.iso_format_naive,
                &self.iso_format_utc,
            )),
        }
    }
}

/// Whether the cell is null or one of the missing-value tokens.
///
/// Tokens are matched exactly and case-sensitively; `"nan"` is a token but
/// `"NAN"` is real text that will fail parsing and be logged.
fn is_missing(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => true,
        CellValue::Text(s) => MISSING_TOKENS.contains(&s.as_str()),
        _ => false,
    }
}

/// Post-parse year correction, applied even to values that parsed cleanly.
///
/// Years below 100 are truncation artifacts and gain 2000; years in
/// [100, 1000) gain 1000; years in [1000, 1950) gain 1000 only if that
/// lands inside the plausible window, otherwise the value is discarded.
/// Years already in [1950, 2100] pass through, as do years above 2100.
fn sanitize_year(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    let year = dt.year();
    if (PLAUSIBLE_YEAR_MIN..=PLAUSIBLE_YEAR_MAX).contains(&year) || year > PLAUSIBLE_YEAR_MAX {
        return Some(dt);
    }
    if year < 100 {
        return dt.with_year(year + 2000);
    }
    if year < 1000 {
        return dt.with_year(year + 1000);
    }
    let shifted = dt.with_year(year + 1000)?;
    if shifted.year() <= PLAUSIBLE_YEAR_MAX {
        Some(shifted)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn normalizer(store_as: DateStorageMode) -> DatetimeNormalizer {
        let config = DatetimeConfig {
            store_as,
            ..DatetimeConfig::default()
        };
        DatetimeNormalizer::new(&config).unwrap()
    }

    fn ndt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_missing_tokens_become_null() {
        let n = normalizer(DateStorageMode::IsoText);
        for token in ["", " ", "-", "\u{2013}", "\u{2014}", "NA", "N/A", "nan", "NaN"] {
            assert_eq!(
                n.normalize_cell(&CellValue::Text(token.into()), false),
                CellOutcome::Null,
                "token {:?}",
                token
            );
        }
        assert_eq!(n.normalize_cell(&CellValue::Null, false), CellOutcome::Null);
    }

    #[test]
    fn test_missing_tokens_are_case_sensitive() {
        let n = normalizer(DateStorageMode::IsoText);
        assert!(matches!(
            n.normalize_cell(&CellValue::Text("NAN".into()), false),
            CellOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_truncated_year_repaired_to_2016() {
        let n = normalizer(DateStorageMode::IsoText);
        let out = n.normalize_cell(&CellValue::Text("03.09.0016 22:57".into()), false);
        assert_eq!(out, CellOutcome::Value(CellValue::Text("2016-09-03 22:57:00".into())));
    }

    #[test]
    fn test_native_datetime_passes_through() {
        let n = normalizer(DateStorageMode::IsoText);
        let out = n.normalize_cell(&CellValue::DateTime(ndt(2023, 5, 1, 8, 0, 0)), false);
        assert_eq!(out, CellOutcome::Value(CellValue::Text("2023-05-01 08:00:00".into())));
    }

    #[test]
    fn test_serial_fallback_lands_in_2023() {
        let n = normalizer(DateStorageMode::IsoText);
        let out = n.normalize_cell(&CellValue::Real(45000.0), false);
        match out {
            CellOutcome::Value(CellValue::Text(s)) => assert!(s.starts_with("2023-"), "{}", s),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_text_reported() {
        let n = normalizer(DateStorageMode::IsoText);
        let out = n.normalize_cell(&CellValue::Text("ráno kolem osmé".into()), false);
        assert_eq!(out, CellOutcome::Failed("ráno kolem osmé".into()));
    }

    #[test]
    fn test_utc_columns_use_utc_format() {
        let n = normalizer(DateStorageMode::IsoText);
        let out = n.normalize_cell(&CellValue::DateTime(ndt(2023, 5, 1, 8, 0, 0)), true);
        assert_eq!(out, CellOutcome::Value(CellValue::Text("2023-05-01T08:00:00Z".into())));
    }

    #[test]
    fn test_unix_ms_mode_yields_integer_milliseconds() {
        let n = normalizer(DateStorageMode::UnixMs);
        let out = n.normalize_cell(&CellValue::DateTime(ndt(1970, 1, 1, 0, 0, 1)), false);
        assert_eq!(out, CellOutcome::Value(CellValue::Int(1000)));
    }

    #[test]
    fn test_year_sanity_windows() {
        assert_eq!(sanitize_year(ndt(16, 9, 3, 0, 0, 0)).unwrap().year(), 2016);
        assert_eq!(sanitize_year(ndt(916, 1, 1, 0, 0, 0)).unwrap().year(), 1916);
        assert_eq!(sanitize_year(ndt(1016, 1, 1, 0, 0, 0)).unwrap().year(), 2016);
        // 1000 + 1500 overshoots the plausible window.
        assert_eq!(sanitize_year(ndt(1500, 1, 1, 0, 0, 0)), None);
        assert_eq!(sanitize_year(ndt(2023, 1, 1, 0, 0, 0)).unwrap().year(), 2023);
        assert_eq!(sanitize_year(ndt(2200, 1, 1, 0, 0, 0)).unwrap().year(), 2200);
    }

    #[test]
    fn test_column_detection_is_case_insensitive() {
        let n = normalizer(DateStorageMode::IsoText);
        assert!(n.is_datetime_column("datum_mereni"));
        assert!(n.is_datetime_column("Datum odběru"));
        assert!(!n.is_datetime_column("hodnota"));
        assert!(n.is_utc_column("cas_utc"));
        assert!(!n.is_utc_column("cas_lokalni"));
    }
}
