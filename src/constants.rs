//! Application constants for the MonRaS importer
//!
//! This module contains the header anchor set, missing-value tokens,
//! storage limits and report settings used throughout the pipeline.

// =============================================================================
// Header Detection
// =============================================================================

/// Anchor phrases for header row detection, already in normalized form
/// (lowercase, no unit annotations, spaces instead of underscores).
///
/// A row is accepted as the header when enough of its cells match members
/// of this set; a partial match suffices because individual exports carry
/// different column subsets.
pub const EXPECTED_HEADER: &[&str] = &[
    "id zppr vzorek",
    "id om",
    "odběrové místo",
    "stálé",
    "zeměpisná délka",
    "zeměpisná šířka",
    "provozovatel",
    "monitorovaná položka",
    "datum a čas odběru začátek",
    "datum a čas odběru konec",
    "datum a čas měření",
    "nuklid",
    "hodnota",
    "jednotka",
    "nejistota",
    "množství",
    "poznámka admin",
];

// =============================================================================
// Missing-Value Handling
// =============================================================================

/// Textual tokens treated as null before any datetime parsing.
///
/// Matched exactly and case-sensitively, as they appear in the exports.
pub const MISSING_TOKENS: &[&str] = &["", " ", "-", "\u{2013}", "\u{2014}", "NA", "N/A", "nan", "NaN"];

// =============================================================================
// Spreadsheet Serial Dates
// =============================================================================

/// Plausible range of spreadsheet serial dates (days since the epoch).
///
/// 20000 is mid-1954, 80000 is year 2118; anything outside is assumed to be
/// an ordinary number rather than an encoded date.
pub const SERIAL_DATE_MIN: f64 = 20_000.0;
pub const SERIAL_DATE_MAX: f64 = 80_000.0;

/// Year of the spreadsheet serial-date epoch, 1899-12-30 (day 0).
pub const SERIAL_EPOCH_YMD: (i32, u32, u32) = (1899, 12, 30);

// =============================================================================
// Year Sanity Bounds
// =============================================================================

/// Years inside this window are accepted as-is after parsing; values below
/// it are corrected or discarded (see the datetime normalizer).
pub const PLAUSIBLE_YEAR_MIN: i32 = 1950;
pub const PLAUSIBLE_YEAR_MAX: i32 = 2100;

// =============================================================================
// SQLite Storage Limits
// =============================================================================

/// Maximum number of bind variables a single SQLite statement accepts.
/// Bounds the rows-per-chunk of the batch loader.
pub const SQLITE_MAX_BIND_VARS: usize = 999;

/// Magnitude above which a REAL value is reported as suspicious
/// (but still written through).
pub const EXTREME_REAL_THRESHOLD: f64 = 1e100;

// =============================================================================
// Diagnostics Report
// =============================================================================

/// Filename of the plain-text diagnostics report, written alongside the
/// destination database when any problem was collected.
pub const PROBLEM_REPORT_FILENAME: &str = "import_problems.txt";

/// Maximum number of example records printed per (file, kind) group.
pub const REPORT_EXAMPLES_PER_GROUP: usize = 20;

/// Length to which offending values are truncated in problem records.
pub const PROBLEM_VALUE_SNIPPET_LEN: usize = 100;

// =============================================================================
// File Discovery
// =============================================================================

/// Prefix of temporary lock files left behind by spreadsheet editors;
/// such files are never imported.
pub const LOCK_FILE_PREFIX: &str = "~$";

/// Fallback table name when the naming rules reduce a filename to nothing.
pub const FALLBACK_TABLE_NAME: &str = "tabulka";

/// Fallback column name when slugification reduces a header to nothing.
pub const FALLBACK_COLUMN_NAME: &str = "col";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_phrases_are_normalized() {
        use crate::app::services::normalize::norm_text;
        for phrase in EXPECTED_HEADER {
            assert_eq!(&norm_text(phrase), phrase, "anchor not in normal form");
        }
    }

    #[test]
    fn test_serial_range_ordering() {
        assert!(SERIAL_DATE_MIN < SERIAL_DATE_MAX);
    }
}
