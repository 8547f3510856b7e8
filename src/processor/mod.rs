//! Main import engine.
//!
//! Orchestrates the complete import workflow: file discovery, header
//! location, column renaming, datetime normalization, value guarding and
//! chunked loading into SQLite, with per-file failure isolation and a
//! run-wide diagnostics log.

pub mod discovery;
pub mod loader;
pub mod workbook;

use crate::app::models::{CellValue, ImportRunStats, StorageType, TableSchema};
use crate::app::services::datetime::{CellOutcome, DatetimeNormalizer};
use crate::app::services::header_locator::locate_header;
use crate::app::services::normalize::rename_columns;
use crate::app::services::problem_log::ProblemLog;
use crate::app::services::table_namer::table_name_for;
use crate::app::services::type_resolver::{build_column_type_map, resolve_storage_types};
use crate::app::services::value_guard::{guard_integer, guard_real, GuardVerdict};
use crate::config::{IfExists, ImportConfig};
use crate::constants::PROBLEM_REPORT_FILENAME;
use crate::error::EtlError;
use crate::Result;

use self::workbook::{Row, Workbook};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// One unit of work for the import loop.
///
/// Files come from discovery; in-memory workbooks exist so that tests can
/// drive the loop without spreadsheet fixtures on disk.
pub enum Source {
    File(PathBuf),
    Memory { label: String, workbook: Workbook },
}

impl Source {
    /// Basename used in diagnostics and table naming.
    fn label(&self) -> String {
        match self {
            Source::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Source::Memory { label, .. } => label.clone(),
        }
    }

    fn as_path(&self) -> PathBuf {
        match self {
            Source::File(path) => path.clone(),
            Source::Memory { label, .. } => PathBuf::from(label),
        }
    }

    fn load(&self) -> Result<Workbook> {
        match self {
            Source::File(path) => Workbook::open(path),
            Source::Memory { workbook, .. } => Ok(workbook.clone()),
        }
    }
}

/// Main processor for one import run.
pub struct ImportProcessor {
    config: ImportConfig,
}

impl ImportProcessor {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Execute the whole pipeline to completion or to a run-level abort.
    ///
    /// Returns the run statistics; recoverable anomalies end up in the
    /// report file and the console summary, not in the returned error.
    pub fn run(&self) -> Result<ImportRunStats> {
        let start_time = Instant::now();
        println!("{}", "Starting MonRaS import".bright_green().bold());

        let db_path = self.config.db_path();
        println!("  {} {}", "Database:".bright_cyan(), db_path.display());

        let files = discovery::discover_files(
            &self.config.input_roots(),
            &self.config.input.glob,
            self.config.input.recursive,
        )?;
        println!(
            "  {} {} spreadsheet files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        );
        if files.is_empty() {
            println!("{}", "No XLSX files found, nothing to do.".bright_yellow());
            return Ok(ImportRunStats::default());
        }

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(&db_path)?;
        loader::apply_pragmas(&conn, &self.config.sqlite.pragmas)?;

        let mut log = ProblemLog::new();
        let mut stats = ImportRunStats::default();
        let sources: Vec<Source> = files.into_iter().map(Source::File).collect();
        self.run_sources(&mut conn, sources, &mut log, &mut stats)?;

        if log.has_problems() {
            let report_path = db_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(PROBLEM_REPORT_FILENAME);
            log.write_report(&report_path)?;
            log.print_summary();
            println!(
                "  {} {}",
                "Problem report:".bright_yellow(),
                report_path.display()
            );
        }

        stats.processing_time = start_time.elapsed();
        println!("\n{}", "Import Summary".bright_green().bold());
        println!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            stats.files_processed.to_string().bright_white()
        );
        if stats.files_failed > 0 {
            println!(
                "  {} {}",
                "Files failed:".bright_red(),
                stats.files_failed.to_string().bright_red().bold()
            );
        }
        println!(
            "  {} {}",
            "Tables written:".bright_cyan(),
            stats.tables_written.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Rows written:".bright_cyan(),
            stats.total_rows.to_string().bright_white().bold()
        );
        println!(
            "  {} {:.1}s",
            "Time elapsed:".bright_cyan(),
            stats.processing_time.as_secs_f64()
        );

        Ok(stats)
    }

    /// Process every source against one destination connection.
    ///
    /// Run-level aborts propagate immediately; any other failure is
    /// recorded against its file and the loop continues. This is the
    /// resilience boundary of the whole pipeline.
    pub fn run_sources(
        &self,
        conn: &mut Connection,
        sources: Vec<Source>,
        log: &mut ProblemLog,
        stats: &mut ImportRunStats,
    ) -> Result<()> {
        let normalizer = DatetimeNormalizer::new(&self.config.schema.datetime)?;
        let type_map =
            build_column_type_map(&self.config.schema.column_types, self.config.schema.datetime.store_as)?;
        let fallback = StorageType::from_logical(
            &self.config.schema.fallback_type,
            self.config.schema.datetime.store_as,
        )
        .ok_or_else(|| {
            EtlError::configuration(format!(
                "schema.fallback_type: unknown type '{}'",
                self.config.schema.fallback_type
            ))
        })?;

        let progress = create_progress_bar(sources.len() as u64);
        let mut tables_seen: HashSet<String> = HashSet::new();
        for source in sources {
            let label = source.label();
            progress.set_message(label.clone());

            match self.process_source(conn, &source, &normalizer, &type_map, fallback, log) {
                Ok((table, rows)) => {
                    stats.files_processed += 1;
                    // Yearly exports share tables; count each table once.
                    if tables_seen.insert(table) {
                        stats.tables_written += 1;
                    }
                    stats.total_rows += rows;
                }
                Err(e) if e.is_run_abort() => {
                    progress.abandon_with_message("aborted".to_string());
                    return Err(e);
                }
                Err(e) => {
                    warn!(file = %label, error = %e, "File failed, continuing");
                    log.add_general_error(&label, "", e.to_string());
                    stats.files_failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_with_message("done");
        Ok(())
    }

    /// Process one source file end to end. Returns the destination table
    /// name and the number of rows written to it.
    fn process_source(
        &self,
        conn: &mut Connection,
        source: &Source,
        normalizer: &DatetimeNormalizer,
        type_map: &HashMap<String, StorageType>,
        fallback: StorageType,
        log: &mut ProblemLog,
    ) -> Result<(String, usize)> {
        let label = source.label();
        let path = source.as_path();
        let table = table_name_for(&path, &self.config.naming);

        // Precondition, checked before any workbook I/O.
        let if_exists = self.config.output.if_exists;
        if if_exists == IfExists::Fail && loader::table_exists(conn, &table)? {
            return Err(EtlError::TableExists { table });
        }

        let workbook = source.load()?;
        let location = locate_header(
            &workbook,
            &path,
            self.config.excel.max_header_scan_rows,
            &self.config.excel.header_match,
        )?;
        let sheet = &workbook.sheets[location.sheet_index];

        let header_row = sheet
            .rows
            .iter()
            .find(|row| row.number == location.row_number)
            .ok_or_else(|| EtlError::HeaderNotFound { path: path.clone() })?;
        let raw_headers: Vec<String> = header_row
            .cells
            .iter()
            .map(CellValue::to_display_string)
            .collect();
        let width = raw_headers.len();

        let columns = rename_columns(
            &raw_headers,
            &self.config.schema.column_aliases,
            self.config.schema.max_identifier_len,
        );

        // Data region: everything below the header, padded to the header
        // width, with all-blank rows dropped.
        let mut data_rows: Vec<Row> = sheet
            .rows
            .iter()
            .filter(|row| row.number > location.row_number)
            .map(|row| {
                let mut cells = row.cells.clone();
                cells.resize(width, CellValue::Null);
                cells.truncate(width);
                Row {
                    number: row.number,
                    cells,
                }
            })
            .filter(|row| !row.cells.iter().all(CellValue::is_blank))
            .collect();

        // Datetime columns, detected by final name.
        for (col_idx, column) in columns.iter().enumerate() {
            if !normalizer.is_datetime_column(column) {
                continue;
            }
            let utc = normalizer.is_utc_column(column);
            for row in &mut data_rows {
                match normalizer.normalize_cell(&row.cells[col_idx], utc) {
                    CellOutcome::Null => row.cells[col_idx] = CellValue::Null,
                    CellOutcome::Value(value) => row.cells[col_idx] = value,
                    CellOutcome::Failed(raw) => {
                        log.add_datetime_error(&label, &sheet.name, column, row.number, &raw);
                        row.cells[col_idx] = CellValue::Null;
                    }
                }
            }
        }

        let resolved = resolve_storage_types(&columns, type_map, fallback);

        // Storage-width guards.
        for (col_idx, (column, storage)) in resolved.iter().enumerate() {
            match storage {
                StorageType::Integer => {
                    for row in &mut data_rows {
                        if let GuardVerdict::Overflow(snapshot) = guard_integer(&row.cells[col_idx])
                        {
                            log.add_value_overflow(&label, &sheet.name, column, row.number, &snapshot);
                            row.cells[col_idx] = CellValue::Null;
                        }
                    }
                }
                StorageType::Real => {
                    for row in &data_rows {
                        if let GuardVerdict::Extreme(snapshot) = guard_real(&row.cells[col_idx]) {
                            log.add_extreme_value(&label, &sheet.name, column, row.number, &snapshot);
                        }
                    }
                }
                StorageType::Text => {}
            }
        }

        let schema = TableSchema {
            table: table.clone(),
            columns: resolved,
        };
        loader::create_table(conn, &schema, if_exists)?;

        let rows: Vec<Vec<CellValue>> = data_rows.into_iter().map(|row| row.cells).collect();
        let written = loader::insert_rows(conn, &schema, &rows, self.config.sqlite.chunk_rows)?;

        if self.config.sqlite.create_indexes {
            loader::create_indexes(conn, &schema, &self.config.sqlite.indexes)?;
        }

        info!(
            file = %label,
            table = %table,
            sheet = %sheet.name,
            rows = written,
            "Imported file"
        );
        Ok((table, written))
    }
}

/// Standard progress bar for the import loop.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests;
