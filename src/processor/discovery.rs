//! Input file discovery.
//!
//! Collects spreadsheet files under the configured roots, matching the
//! configured glob pattern, optionally recursing. Editor lock files
//! (`~$...`) are always excluded. The result is sorted and deduplicated
//! so that runs are stable across filesystems.

use crate::error::EtlError;
use crate::Result;
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::LOCK_FILE_PREFIX;

/// Whether a file name belongs to an editor lock file.
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with(LOCK_FILE_PREFIX))
        .unwrap_or(false)
}

/// Discover input files under `roots` matching `pattern`.
pub fn discover_files(roots: &[PathBuf], pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern)
        .map_err(|e| EtlError::configuration(format!("input.glob '{}': {}", pattern, e)))?;

    let mut found = BTreeSet::new();
    for root in roots {
        if !root.exists() {
            debug!(root = %root.display(), "Input root does not exist, skipping");
            continue;
        }

        let walker = if recursive {
            WalkDir::new(root)
        } else {
            WalkDir::new(root).max_depth(1)
        };

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || is_lock_file(path) {
                continue;
            }
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            if matcher.matches(&name) {
                found.insert(path.to_path_buf());
            }
        }
    }

    let files: Vec<PathBuf> = found.into_iter().collect();
    debug!(count = files.len(), "Discovered input files");
    Ok(files)
}
