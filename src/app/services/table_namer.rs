//! Table name derivation from source filenames.
//!
//! Export filenames carry years, version counters and free-form labels;
//! the namer strips the volatile parts so that yearly exports of the same
//! dataset land in one table.

use crate::app::services::normalize::slugify_identifier;
use crate::config::NamingConfig;
use crate::constants::FALLBACK_TABLE_NAME;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static VERSION_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]*\(?\d+\)?\s*$").expect("version suffix pattern"));

static TRAILING_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]*(19\d{2}|20\d{2})\s*$").expect("trailing year pattern"));

static EMBEDDED_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("embedded year pattern"));

/// Derive the destination table name for a source file.
pub fn table_name_for(path: &Path, rules: &NamingConfig) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = stem;
    if rules.drop_trailing_version_suffix {
        name = VERSION_SUFFIX_RE.replace(&name, "").into_owned();
    }
    if rules.drop_years {
        name = TRAILING_YEAR_RE.replace(&name, "").into_owned();
        name = EMBEDDED_YEAR_RE.replace_all(&name, "").into_owned();
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    let capped = words
        .into_iter()
        .take(rules.keep_max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if capped.trim().is_empty() {
        return FALLBACK_TABLE_NAME.to_string();
    }
    slugify_identifier(&capped, rules.max_len)
}
