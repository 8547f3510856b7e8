//! Textual and serial-number parsing strategies.

use crate::constants::{SERIAL_DATE_MAX, SERIAL_DATE_MIN, SERIAL_EPOCH_YMD};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Formats tried in the primary, day-before-month pass. Each entry pairs
/// a chrono format string with whether it carries a time component.
const DAY_FIRST_FORMATS: &[(&str, bool)] = &[
    ("%d.%m.%Y %H:%M:%S", true),
    ("%d.%m.%Y %H:%M", true),
    ("%d.%m.%Y", false),
    ("%d/%m/%Y %H:%M:%S", true),
    ("%d/%m/%Y %H:%M", true),
    ("%d/%m/%Y", false),
    ("%d-%m-%Y %H:%M:%S", true),
    ("%d-%m-%Y %H:%M", true),
    ("%d-%m-%Y", false),
    // ISO forms are unambiguous and belong to the primary pass.
    ("%Y-%m-%dT%H:%M:%S", true),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y-%m-%d %H:%M", true),
    ("%Y-%m-%d", false),
];

/// Formats tried in the secondary, month-before-day pass for values the
/// primary pass rejected.
const MONTH_FIRST_FORMATS: &[(&str, bool)] = &[
    ("%m/%d/%Y %H:%M:%S", true),
    ("%m/%d/%Y %H:%M", true),
    ("%m/%d/%Y", false),
    ("%m.%d.%Y %H:%M:%S", true),
    ("%m.%d.%Y %H:%M", true),
    ("%m.%d.%Y", false),
    ("%m-%d-%Y %H:%M:%S", true),
    ("%m-%d-%Y %H:%M", true),
    ("%m-%d-%Y", false),
];

fn try_formats(s: &str, formats: &[(&str, bool)]) -> Option<NaiveDateTime> {
    for (format, has_time) in formats {
        if *has_time {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt);
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse free text, day-first preference then month-first retry.
pub fn parse_text(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    try_formats(trimmed, DAY_FIRST_FORMATS).or_else(|| try_formats(trimmed, MONTH_FIRST_FORMATS))
}

/// Interpret a plausible spreadsheet serial number as a timestamp.
///
/// Whole days offset from the 1899-12-30 epoch, fractional part as
/// seconds within the day. Numbers outside [20000, 80000] are assumed to
/// be ordinary data, not encoded dates.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(SERIAL_DATE_MIN..=SERIAL_DATE_MAX).contains(&serial) {
        return None;
    }
    let days = serial.floor();
    let day_seconds = ((serial - days) * 86_400.0).round() as i64;
    let (year, month, day) = SERIAL_EPOCH_YMD;
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::seconds(day_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_day_first_wins_over_month_first() {
        // 03.04 is April 3rd, not March 4th.
        let dt = parse_text("03.04.2021").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2021, 4, 3));
    }

    #[test]
    fn test_month_first_retry_catches_us_style() {
        // Day-first rejects month 25, the retry succeeds.
        let dt = parse_text("12/25/2021 08:30").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2021, 12, 25));
        assert_eq!((dt.hour(), dt.minute()), (8, 30));
    }

    #[test]
    fn test_iso_forms_accepted() {
        assert!(parse_text("2023-05-01T12:00:00").is_some());
        assert!(parse_text("2023-05-01 12:00").is_some());
        assert!(parse_text("2023-05-01").is_some());
    }

    #[test]
    fn test_date_only_gets_midnight() {
        let dt = parse_text("1.2.2023").unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 0, 0));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_text("").is_none());
        assert!(parse_text("hodnota").is_none());
        assert!(parse_text("99.99.2021").is_none());
    }

    #[test]
    fn test_serial_epoch_alignment() {
        // Serial 45000 is 2023-03-15 under the 1899-12-30 epoch.
        let dt = serial_to_datetime(45000.0).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 3, 15));
    }

    #[test]
    fn test_serial_fraction_becomes_time_of_day() {
        let dt = serial_to_datetime(45000.5).unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (12, 0, 0));
    }

    #[test]
    fn test_serials_outside_plausible_range_rejected() {
        assert!(serial_to_datetime(19999.0).is_none());
        assert!(serial_to_datetime(80001.0).is_none());
        assert!(serial_to_datetime(f64::NAN).is_none());
        assert!(serial_to_datetime(1.5).is_none());
    }
}
