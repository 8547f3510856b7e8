//! SQLite batch loading.
//!
//! Creates or extends destination tables and writes rows in chunks sized
//! against the engine's bind-variable ceiling. Each chunk is one
//! transaction; a file's rows are committed in chunk order and never
//! interleave with another file's.

use crate::app::models::{CellValue, TableSchema};
use crate::config::IfExists;
use crate::constants::SQLITE_MAX_BIND_VARS;
use crate::error::EtlError;
use crate::Result;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Apply configured PRAGMA settings to a fresh connection.
pub fn apply_pragmas(conn: &Connection, pragmas: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in pragmas {
        conn.pragma_update(None, key, value)?;
    }
    Ok(())
}

/// Whether `table` exists in the destination database.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Column names of an existing table, in declaration order.
fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Create or prepare the destination table per the `if_exists` policy.
///
/// `replace` drops any existing table and recreates it. `append` keeps an
/// existing table but requires every resolved column to already exist in
/// it. `fail` is a run-level precondition and is checked by the caller
/// before any workbook I/O; by the time this function runs it behaves
/// like `append`-into-nothing.
pub fn create_table(conn: &Connection, schema: &TableSchema, if_exists: IfExists) -> Result<()> {
    let exists = table_exists(conn, &schema.table)?;

    if exists && if_exists == IfExists::Replace {
        conn.execute(&format!("DROP TABLE IF EXISTS \"{}\"", schema.table), [])?;
    } else if exists && if_exists == IfExists::Append {
        let present = existing_columns(conn, &schema.table)?;
        for (column, _) in &schema.columns {
            if !present.contains(column) {
                return Err(EtlError::SchemaMismatch {
                    table: schema.table.clone(),
                    column: column.clone(),
                });
            }
        }
        return Ok(());
    }

    let column_defs = schema
        .columns
        .iter()
        .map(|(name, storage)| format!("\"{}\" {}", name, storage.as_sql_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        schema.table, column_defs
    );
    conn.execute(&sql, [])?;
    debug!(table = %schema.table, columns = schema.columns.len(), "Created table");
    Ok(())
}

/// Rows per chunk such that `rows * column_count` stays within the
/// bind-variable ceiling, never below one row.
pub fn effective_chunk_rows(configured: usize, column_count: usize) -> usize {
    let ceiling = (SQLITE_MAX_BIND_VARS / column_count.max(1)).max(1);
    configured.min(ceiling).max(1)
}

/// Insert `rows` into the schema's table in chunked transactions.
///
/// Returns the number of rows written. Rows must already match the
/// schema's column order and width.
pub fn insert_rows(
    conn: &mut Connection,
    schema: &TableSchema,
    rows: &[Vec<CellValue>],
    configured_chunk_rows: usize,
) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let column_count = schema.columns.len();
    let chunk_rows = effective_chunk_rows(configured_chunk_rows, column_count);

    let column_list = schema
        .columns
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    let row_placeholder = format!(
        "({})",
        vec!["?"; column_count].join(", ")
    );

    let mut written = 0;
    for chunk in rows.chunks(chunk_rows) {
        let placeholders = vec![row_placeholder.as_str(); chunk.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES {}",
            schema.table, column_list, placeholders
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            let flat = chunk.iter().flat_map(|row| row.iter());
            stmt.execute(params_from_iter(flat))?;
        }
        tx.commit()?;
        written += chunk.len();
    }

    debug!(table = %schema.table, rows = written, chunk_rows, "Inserted rows");
    Ok(written)
}

/// Create the configured indexes whose columns all exist in the schema.
///
/// A spec naming any absent column is skipped whole; empty specs are
/// ignored.
pub fn create_indexes(
    conn: &Connection,
    schema: &TableSchema,
    index_specs: &[Vec<String>],
) -> Result<usize> {
    let mut created = 0;
    for spec in index_specs {
        if spec.is_empty() {
            continue;
        }
        if let Some(missing) = spec.iter().find(|column| !schema.has_column(column)) {
            warn!(
                table = %schema.table,
                column = %missing,
                "Skipping index spec naming an absent column"
            );
            continue;
        }

        let index_name = format!("idx_{}_{}", schema.table, spec.join("_"));
        let column_list = spec
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({})",
                index_name, schema.table, column_list
            ),
            [],
        )?;
        created += 1;
    }
    Ok(created)
}
