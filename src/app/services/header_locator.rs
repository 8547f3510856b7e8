//! Header row detection.
//!
//! MonRaS exports bury the column header under a variable number of title
//! and metadata rows, sometimes on a later sheet. The locator scans each
//! sheet top-down and accepts the first row whose cells match enough of
//! the known anchor phrases.

use crate::app::services::normalize::norm_text;
use crate::config::HeaderMatchConfig;
use crate::constants::EXPECTED_HEADER;
use crate::error::EtlError;
use crate::processor::workbook::{Row, Workbook};
use crate::Result;
use std::path::Path;
use tracing::debug;

/// Location of the accepted header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Index of the sheet within the workbook.
    pub sheet_index: usize,
    /// 1-based Excel row number of the header row.
    pub row_number: u32,
}

/// Scan result for one candidate row.
struct RowScore {
    hits: usize,
    nonempty: usize,
}

fn score_row(row: &Row) -> RowScore {
    let mut hits = 0;
    let mut nonempty = 0;
    for cell in &row.cells {
        if cell.is_blank() {
            continue;
        }
        nonempty += 1;
        let normal = norm_text(&cell.to_display_string());
        if EXPECTED_HEADER.contains(&normal.as_str()) {
            hits += 1;
        }
    }
    RowScore { hits, nonempty }
}

/// Find the header row in `workbook`.
///
/// Sheets are scanned in workbook order, rows in sheet order up to
/// `max_scan_rows` (by Excel row number). A row is accepted when it has at
/// least `match_config.min_hits` anchor matches and the matches make up at
/// least `match_config.min_ratio` of its non-blank cells. The first
/// accepted row wins.
pub fn locate_header(
    workbook: &Workbook,
    path: &Path,
    max_scan_rows: u32,
    match_config: &HeaderMatchConfig,
) -> Result<HeaderLocation> {
    for (sheet_index, sheet) in workbook.sheets.iter().enumerate() {
        for row in &sheet.rows {
            if row.number > max_scan_rows {
                break;
            }
            let score = score_row(row);
            if score.nonempty == 0 {
                continue;
            }
            let ratio = score.hits as f64 / score.nonempty as f64;
            if score.hits >= match_config.min_hits && ratio >= match_config.min_ratio {
                debug!(
                    sheet = %sheet.name,
                    row = row.number,
                    hits = score.hits,
                    nonempty = score.nonempty,
                    "Accepted header row"
                );
                return Ok(HeaderLocation {
                    sheet_index,
                    row_number: row.number,
                });
            }
        }
    }

    Err(EtlError::HeaderNotFound {
        path: path.to_path_buf(),
    })
}
