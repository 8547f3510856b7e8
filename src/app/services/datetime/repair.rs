//! String-level repair of the year-truncation corruption.
//!
//! Some exports zero-pad a four-digit year down to its last two digits,
//! so `03.09.2016 22:57` arrives as `03.09.0016 22:57`. Generic parsers
//! would happily accept year 16, so the year segment is rewritten to
//! `20YY` before any parsing runs.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static DOTTED_TRUNCATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2})\.(\d{1,2})\.00(\d{2})(.*)$").expect("dotted truncation pattern")
});

static ISO_TRUNCATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*00(\d{2})-(\d{1,2})-(\d{1,2})(.*)$").expect("iso truncation pattern")
});

/// Rewrite a truncated `00YY` year segment to `20YY`.
///
/// Handles the dotted form `D.M.00YY[ time]` and the dashed form
/// `00YY-M-D[ time]`; anything else passes through unchanged.
pub fn repair_year_truncation(s: &str) -> Cow<'_, str> {
    if let Some(caps) = DOTTED_TRUNCATED_RE.captures(s) {
        return Cow::Owned(format!("{}.{}.20{}{}", &caps[1], &caps[2], &caps[3], &caps[4]));
    }
    if let Some(caps) = ISO_TRUNCATED_RE.captures(s) {
        return Cow::Owned(format!("20{}-{}-{}{}", &caps[1], &caps[2], &caps[3], &caps[4]));
    }
    Cow::Borrowed(s)
}
