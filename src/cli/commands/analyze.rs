//! Analyze command implementation.
//!
//! Read-only overview of a destination database produced by the importer:
//! per-table row counts and column lists, plus a cross-table consistency
//! check that flags columns present in only some tables. Useful after a
//! large import to spot exports whose headers drifted.

use crate::cli::args::AnalyzeArgs;
use crate::cli::commands::shared::{load_configuration, setup_logging};
use crate::error::EtlError;
use crate::Result;
use colored::Colorize;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Run the database overview.
pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    args.validate()?;
    setup_logging(args.get_log_level(), false)?;

    let db_path = resolve_database(&args)?;
    if !db_path.exists() {
        return Err(EtlError::configuration(format!(
            "Database does not exist: {}",
            db_path.display()
        )));
    }

    println!("{}", "MonRaS Database Overview".bright_green().bold());
    println!("  {} {}\n", "Database:".bright_cyan(), db_path.display());

    let conn = Connection::open(&db_path)?;
    let tables = list_tables(&conn)?;
    println!(
        "{} {}",
        "Tables:".bright_cyan(),
        tables.len().to_string().bright_white().bold()
    );

    let mut column_tables: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for table in &tables {
        let columns = table_columns(&conn, table)?;
        let rows: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table),
            [],
            |row| row.get(0),
        )?;
        let listing = columns
            .iter()
            .map(|(name, decl_type)| format!("{} {}", name, decl_type))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} ({} rows): {}",
            table.bright_white().bold(),
            rows,
            listing
        );
        for (column, _) in columns {
            column_tables.entry(column).or_default().push(table.clone());
        }
    }

    // Columns missing from some tables usually mean a source export whose
    // header drifted from the rest.
    let inconsistent: Vec<_> = column_tables
        .iter()
        .filter(|(_, tables_with)| tables_with.len() < tables.len())
        .collect();

    if !inconsistent.is_empty() {
        println!(
            "\n{}",
            "Columns not present in every table".bright_yellow().bold()
        );
        for (column, tables_with) in inconsistent {
            println!(
                "  {}: {}/{} tables ({})",
                column.bright_yellow(),
                tables_with.len(),
                tables.len(),
                tables_with.join(", ")
            );
        }
    } else if !tables.is_empty() {
        println!("\n{}", "All tables share the same columns.".bright_green());
    }

    Ok(())
}

fn resolve_database(args: &AnalyzeArgs) -> Result<PathBuf> {
    if let Some(database) = &args.database {
        return Ok(database.clone());
    }
    let config = load_configuration(args.config_file.as_ref())?;
    Ok(config.db_path())
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tables)
}

/// Column (name, declared type) pairs of a table, in declaration order.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let columns = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tables_skips_internal() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE mleko (id INTEGER PRIMARY KEY AUTOINCREMENT)", [])
            .unwrap();
        conn.execute("CREATE TABLE ovzdusi (id INTEGER)", []).unwrap();

        let tables = list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["mleko", "ovzdusi"]);
    }

    #[test]
    fn test_table_columns_in_declaration_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (b TEXT, a INTEGER)", []).unwrap();

        let columns = table_columns(&conn, "t").unwrap();
        assert_eq!(
            columns,
            vec![
                ("b".to_string(), "TEXT".to_string()),
                ("a".to_string(), "INTEGER".to_string()),
            ]
        );
    }
}
