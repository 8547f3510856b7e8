//! Header text normalization and identifier slugification.
//!
//! Two distinct normal forms are used: [`norm_text`] for matching header
//! cells against anchor phrases and alias keys, and [`slugify_identifier`]
//! for producing safe SQLite column and table identifiers.

use crate::constants::FALLBACK_COLUMN_NAME;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static UNIT_ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[[^\]]*\]").expect("unit annotation pattern"));

/// Matching normal form of a header cell.
///
/// Line breaks and tabs become spaces, whitespace runs collapse to one
/// space, the result is trimmed and lowercased, bracketed unit annotations
/// such as `[Bq/m3]` are removed, and underscores become spaces. The
/// underscore replacement runs last and deliberately does not re-collapse,
/// matching how header variants appear in the exports.
pub fn norm_text(s: &str) -> String {
    let unified = s.replace(['\r', '\n', '\t'], " ");
    let collapsed = unified
        .split(' ')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let lowered = collapsed.trim().to_lowercase();
    let without_units = UNIT_ANNOTATION_RE.replace_all(&lowered, "");
    // Stripping a leading annotation can leave edge whitespace behind.
    without_units.trim().replace('_', " ")
}

/// Slugify a header into a safe SQLite identifier.
///
/// Diacritics are stripped by NFKD decomposition, anything outside
/// `[a-z0-9]` collapses into single underscores, a leading digit gets a
/// `c_` prefix, and the result is truncated to `max_len` bytes. An input
/// that slugs away to nothing yields the fallback column name.
pub fn slugify_identifier(s: &str, max_len: usize) -> String {
    let stripped: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(stripped.len());
    let mut last_was_sep = true;
    for c in stripped.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let mut slug = slug.trim_matches('_').to_string();

    if slug.is_empty() {
        return FALLBACK_COLUMN_NAME.to_string();
    }
    if slug.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        slug = format!("c_{}", slug);
    }
    if slug.len() > max_len {
        slug.truncate(max_len);
        slug = slug.trim_end_matches('_').to_string();
    }
    slug
}

/// Disambiguate duplicate identifiers in first-seen order.
///
/// The first occurrence keeps its name; later occurrences get `_2`, `_3`
/// and so on.
pub fn make_unique(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = counts.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{}_{}", name, count)
            }
        })
        .collect()
}

/// Map raw header cells to final column identifiers.
///
/// Each header is first looked up in the alias table under its matching
/// normal form; unaliased headers are slugified. The final list is
/// deduplicated with [`make_unique`].
pub fn rename_columns(
    raw_headers: &[String],
    aliases: &BTreeMap<String, String>,
    max_len: usize,
) -> Vec<String> {
    let normalized_aliases: HashMap<String, &String> = aliases
        .iter()
        .map(|(key, target)| (norm_text(key), target))
        .collect();

    let renamed: Vec<String> = raw_headers
        .iter()
        .map(|raw| {
            let normal = norm_text(raw);
            match normalized_aliases.get(&normal) {
                Some(target) => (*target).clone(),
                None => slugify_identifier(raw, max_len),
            }
        })
        .collect();

    make_unique(renamed)
}
