//! Append-only collector of import anomalies.
//!
//! Problems accumulate over the whole run and never cause an abort. When
//! the run ends with a non-empty log, a grouped textual report is written
//! alongside the destination database and a colored summary goes to the
//! console.

use crate::app::models::{truncate_chars, ProblemKind, ProblemRecord};
use crate::constants::{PROBLEM_VALUE_SNIPPET_LEN, REPORT_EXAMPLES_PER_GROUP};
use crate::Result;
use chrono::Local;
use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Run-wide problem collector.
#[derive(Debug, Default)]
pub struct ProblemLog {
    records: Vec<ProblemRecord>,
}

impl ProblemLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. The value snapshot is truncated here so that
    /// callers can pass raw cell text without worrying about size.
    pub fn add(
        &mut self,
        file: impl Into<String>,
        sheet: impl Into<String>,
        column: impl Into<String>,
        row: Option<u32>,
        value: &str,
        kind: ProblemKind,
        message: impl Into<String>,
    ) {
        self.records.push(ProblemRecord {
            file: file.into(),
            sheet: sheet.into(),
            column: column.into(),
            row,
            value: truncate_chars(value, PROBLEM_VALUE_SNIPPET_LEN),
            kind,
            message: message.into(),
        });
    }

    pub fn add_datetime_error(
        &mut self,
        file: &str,
        sheet: &str,
        column: &str,
        row: u32,
        value: &str,
    ) {
        self.add(
            file,
            sheet,
            column,
            Some(row),
            value,
            ProblemKind::DatetimeError,
            "Invalid date/time format",
        );
    }

    pub fn add_value_overflow(
        &mut self,
        file: &str,
        sheet: &str,
        column: &str,
        row: u32,
        value: &str,
    ) {
        self.add(
            file,
            sheet,
            column,
            Some(row),
            value,
            ProblemKind::ValueOverflow,
            "Value too large for a SQLite INTEGER (max 2^63-1)",
        );
    }

    pub fn add_extreme_value(
        &mut self,
        file: &str,
        sheet: &str,
        column: &str,
        row: u32,
        value: &str,
    ) {
        self.add(
            file,
            sheet,
            column,
            Some(row),
            value,
            ProblemKind::ExtremeValue,
            "Implausibly large value retained in REAL column",
        );
    }

    pub fn add_general_error(&mut self, file: &str, sheet: &str, message: impl Into<String>) {
        self.add(file, sheet, "", None, "", ProblemKind::GeneralError, message);
    }

    pub fn has_problems(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ProblemRecord] {
        &self.records
    }

    /// Render the grouped textual report.
    ///
    /// Records group by file, then by kind; each (file, kind) group prints
    /// at most a fixed number of examples with a "+N more" line when cut.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);
        let subrule = "-".repeat(80);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "XLSX -> SQLite IMPORT PROBLEM REPORT");
        let _ = writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Total problems: {}", self.records.len());
        let _ = writeln!(out, "{}\n", rule);

        let mut by_file: BTreeMap<&str, Vec<&ProblemRecord>> = BTreeMap::new();
        for record in &self.records {
            by_file.entry(record.file.as_str()).or_default().push(record);
        }

        for (file, records) in by_file {
            let _ = writeln!(out, "{}", subrule);
            let _ = writeln!(out, "FILE: {}", file);
            let _ = writeln!(out, "Problems: {}", records.len());
            let _ = writeln!(out, "{}\n", subrule);

            let mut by_kind: BTreeMap<ProblemKind, Vec<&ProblemRecord>> = BTreeMap::new();
            for record in records {
                by_kind.entry(record.kind).or_default().push(record);
            }

            for (kind, group) in by_kind {
                let _ = writeln!(out, "  [{}] ({}x)", kind, group.len());
                for record in group.iter().take(REPORT_EXAMPLES_PER_GROUP) {
                    match (record.row, record.column.is_empty()) {
                        (Some(row), _) => {
                            let _ = writeln!(
                                out,
                                "    - Row {}, column '{}': {}",
                                row, record.column, record.message
                            );
                            if !record.value.is_empty() {
                                let _ = writeln!(out, "      Value: {}", record.value);
                            }
                        }
                        (None, false) => {
                            let _ = writeln!(
                                out,
                                "    - Column '{}': {}",
                                record.column, record.message
                            );
                        }
                        (None, true) => {
                            let _ = writeln!(out, "    - {}", record.message);
                        }
                    }
                }
                if group.len() > REPORT_EXAMPLES_PER_GROUP {
                    let _ = writeln!(
                        out,
                        "    +{} more of the same kind",
                        group.len() - REPORT_EXAMPLES_PER_GROUP
                    );
                }
                let _ = writeln!(out);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "END OF REPORT");
        let _ = writeln!(out, "{}", rule);
        out
    }

    /// Write the report to `path`. A log with no records writes nothing.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }
        std::fs::write(path, self.render_report())?;
        Ok(())
    }

    /// Print the colored console summary: total count, then one line per
    /// problem kind.
    pub fn print_summary(&self) {
        if self.records.is_empty() {
            return;
        }
        let mut by_kind: BTreeMap<ProblemKind, usize> = BTreeMap::new();
        for record in &self.records {
            *by_kind.entry(record.kind).or_insert(0) += 1;
        }

        println!();
        println!(
            "{} {} problems found during import:",
            "⚠".bright_yellow(),
            self.records.len().to_string().bright_yellow()
        );
        for (kind, count) in by_kind {
            println!("   - {}: {}x", kind.to_string().bright_cyan(), count);
        }
    }
}
