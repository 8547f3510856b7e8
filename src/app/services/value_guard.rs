//! Storage-width guards applied at write time.
//!
//! INTEGER columns reject values outside the signed 64-bit range by
//! nulling them, because such a value cannot be stored at all. REAL
//! columns merely flag magnitudes above the extreme threshold and write
//! them through; a float column can represent them even if they are
//! almost certainly wrong.

use crate::app::models::CellValue;
use crate::constants::EXTREME_REAL_THRESHOLD;

/// Lowest f64 strictly above `i64::MAX`; `i64::MAX as f64` rounds up to
/// exactly 2^63, which is already out of range.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;
const I64_LOWER_BOUND: f64 = -9_223_372_036_854_775_808.0;

/// Verdict of screening one cell against its column's storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardVerdict {
    /// Value fits; write as-is.
    Pass,
    /// Value cannot be stored as a 64-bit integer; write null instead
    /// and log VALUE_OVERFLOW. Carries a snapshot of the original.
    Overflow(String),
    /// Value is implausibly large for a measurement but representable;
    /// write through and log EXTREME_VALUE.
    Extreme(String),
}

/// Screen a cell destined for an INTEGER column.
pub fn guard_integer(cell: &CellValue) -> GuardVerdict {
    // Native i64 cells are in range by construction.
    if matches!(cell, CellValue::Int(_) | CellValue::Null | CellValue::Bool(_)) {
        return GuardVerdict::Pass;
    }
    // Exact parse before the float comparison: boundary values such as
    // i64::MAX written as text round up to 2^63 through f64 and would
    // falsely overflow.
    if let CellValue::Text(s) = cell {
        if s.trim().parse::<i64>().is_ok() {
            return GuardVerdict::Pass;
        }
    }
    match cell.numeric_value() {
        Some(f) if f.is_nan() => GuardVerdict::Pass,
        Some(f) if f >= I64_UPPER_BOUND || f < I64_LOWER_BOUND => {
            GuardVerdict::Overflow(cell.to_display_string())
        }
        _ => GuardVerdict::Pass,
    }
}

/// Screen a cell destined for a REAL column.
pub fn guard_real(cell: &CellValue) -> GuardVerdict {
    match cell.numeric_value() {
        Some(f) if f.is_finite() && f.abs() > EXTREME_REAL_THRESHOLD => {
            GuardVerdict::Extreme(cell.to_display_string())
        }
        _ => GuardVerdict::Pass,
    }
}
