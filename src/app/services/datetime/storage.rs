//! Physical storage encoding of normalized timestamps.

use crate::app::models::CellValue;
use crate::config::DateStorageMode;
use chrono::NaiveDateTime;

/// Encode a normalized timestamp for its destination column.
///
/// Under `iso_text` the naive and UTC cases use their own configured
/// format strings. Under `unix_ms` the value becomes integer epoch
/// milliseconds, computed by 64-bit division from the nanosecond internal
/// representation; naive values are encoded as if they were UTC, which is
/// the documented behavior of this mode. Timestamps outside the
/// nanosecond-representable range encode as null.
pub fn encode(
    dt: NaiveDateTime,
    utc: bool,
    store_as: DateStorageMode,
    iso_format_naive: &str,
    iso_format_utc: &str,
) -> CellValue {
    match store_as {
        DateStorageMode::IsoText => {
            let format = if utc { iso_format_utc } else { iso_format_naive };
            CellValue::Text(dt.format(format).to_string())
        }
        DateStorageMode::UnixMs => match dt.and_utc().timestamp_nanos_opt() {
            Some(nanos) => CellValue::Int(nanos / 1_000_000),
            None => CellValue::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ndt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_iso_text_uses_per_zone_formats() {
        let dt = ndt(2023, 5, 1, 8, 30, 0);
        assert_eq!(
            encode(dt, false, DateStorageMode::IsoText, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"),
            CellValue::Text("2023-05-01 08:30:00".into())
        );
        assert_eq!(
            encode(dt, true, DateStorageMode::IsoText, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"),
            CellValue::Text("2023-05-01T08:30:00Z".into())
        );
    }

    #[test]
    fn test_unix_ms_division_truncates_sub_millisecond() {
        let dt = ndt(1970, 1, 1, 0, 0, 1);
        assert_eq!(
            encode(dt, false, DateStorageMode::UnixMs, "", ""),
            CellValue::Int(1000)
        );
    }

    #[test]
    fn test_unix_ms_pre_epoch_is_negative() {
        let dt = ndt(1969, 12, 31, 23, 59, 59);
        assert_eq!(
            encode(dt, true, DateStorageMode::UnixMs, "", ""),
            CellValue::Int(-1000)
        );
    }

    #[test]
    fn test_out_of_range_timestamp_becomes_null() {
        let dt = ndt(2600, 1, 1, 0, 0, 0);
        assert_eq!(encode(dt, false, DateStorageMode::UnixMs, "", ""), CellValue::Null);
    }
}
