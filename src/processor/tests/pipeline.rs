//! End-to-end pipeline tests over in-memory workbooks.

use crate::app::models::{CellValue, ImportRunStats};
use crate::app::services::problem_log::ProblemLog;
use crate::config::{
    DatetimeConfig, ExcelConfig, HeaderMatchConfig, IfExists, ImportConfig, InputConfig,
    NamingConfig, OutputConfig, SchemaConfig, SqliteConfig,
};
use crate::error::EtlError;
use crate::processor::workbook::{Row, Sheet, Workbook};
use crate::processor::{ImportProcessor, Source};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::PathBuf;

const HEADER: &[&str] = &[
    "ID OM",
    "Odběrové místo",
    "Nuklid",
    "Datum a čas měření",
    "Hodnota [Bq/m3]",
    "Jednotka",
    "Nejistota",
];

fn test_config() -> ImportConfig {
    let mut column_types = BTreeMap::new();
    column_types.insert("INTEGER".to_string(), vec!["id_om".to_string()]);
    column_types.insert(
        "REAL".to_string(),
        vec!["hodnota_bq_m3".to_string(), "nejistota".to_string()],
    );

    ImportConfig {
        input: InputConfig {
            roots: vec![PathBuf::from("unused")],
            glob: "*.xlsx".to_string(),
            recursive: false,
        },
        excel: ExcelConfig {
            max_header_scan_rows: 40,
            header_match: HeaderMatchConfig {
                min_hits: 4,
                min_ratio: 0.5,
            },
        },
        schema: SchemaConfig {
            column_types,
            datetime: DatetimeConfig {
                detect_regex: "datum".to_string(),
                ..DatetimeConfig::default()
            },
            ..SchemaConfig::default()
        },
        naming: NamingConfig::default(),
        output: OutputConfig {
            sqlite_path: PathBuf::from("unused.sqlite"),
            if_exists: IfExists::Replace,
        },
        sqlite: SqliteConfig::default(),
        base_dir: PathBuf::from("."),
    }
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn header_row(number: u32) -> Row {
    Row {
        number,
        cells: HEADER.iter().map(|h| text(h)).collect(),
    }
}

fn data_row(number: u32, id: i64, datum: &str, hodnota: f64) -> Row {
    Row {
        number,
        cells: vec![
            CellValue::Int(id),
            text("Praha"),
            text("Cs-137"),
            text(datum),
            CellValue::Real(hodnota),
            text("Bq/m3"),
            CellValue::Real(0.1),
        ],
    }
}

fn single_sheet_workbook(rows: Vec<Row>) -> Workbook {
    Workbook {
        sheets: vec![Sheet {
            name: "Data".to_string(),
            rows,
        }],
    }
}

fn good_workbook() -> Workbook {
    single_sheet_workbook(vec![
        Row {
            number: 1,
            cells: vec![text("MonRaS export"), CellValue::Null],
        },
        header_row(3),
        data_row(4, 101, "01.02.2023 10:30:00", 0.42),
        data_row(5, 102, "02.02.2023 11:00:00", 0.44),
    ])
}

fn run(
    config: &ImportConfig,
    conn: &mut Connection,
    sources: Vec<Source>,
) -> (crate::Result<()>, ProblemLog, ImportRunStats) {
    let processor = ImportProcessor::new(config.clone());
    let mut log = ProblemLog::new();
    let mut stats = ImportRunStats::default();
    let result = processor.run_sources(conn, sources, &mut log, &mut stats);
    (result, log, stats)
}

#[test]
fn test_full_pipeline_creates_typed_table() {
    let config = test_config();
    let mut conn = Connection::open_in_memory().unwrap();

    let sources = vec![Source::Memory {
        label: "Ovzduší 2023.xlsx".to_string(),
        workbook: good_workbook(),
    }];
    let (result, log, stats) = run(&config, &mut conn, sources);

    result.unwrap();
    assert!(!log.has_problems());
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.tables_written, 1);
    assert_eq!(stats.total_rows, 2);

    // Year and version stripped from the table name.
    let (id, datum, hodnota): (i64, String, f64) = conn
        .query_row(
            "SELECT id_om, datum_a_cas_mereni, hodnota_bq_m3 FROM ovzdusi ORDER BY id_om",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(id, 101);
    assert_eq!(datum, "2023-02-01 10:30:00");
    assert!((hodnota - 0.42).abs() < 1e-9);
}

#[test]
fn test_file_isolation_one_bad_file_does_not_stop_the_run() {
    let config = test_config();
    let mut conn = Connection::open_in_memory().unwrap();

    // The middle workbook has no header row anywhere.
    let headerless = single_sheet_workbook(vec![Row {
        number: 1,
        cells: vec![text("jen poznámky"), text("nic dalšího")],
    }]);

    let sources = vec![
        Source::Memory {
            label: "prvni.xlsx".to_string(),
            workbook: good_workbook(),
        },
        Source::Memory {
            label: "rozbity.xlsx".to_string(),
            workbook: headerless,
        },
        Source::Memory {
            label: "treti.xlsx".to_string(),
            workbook: good_workbook(),
        },
    ];
    let (result, log, stats) = run(&config, &mut conn, sources);

    result.unwrap();
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.tables_written, 2);

    for table in ["prvni", "treti"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 2, "table {} incomplete", table);
    }

    let general: Vec<_> = log
        .records()
        .iter()
        .filter(|r| r.kind == crate::app::models::ProblemKind::GeneralError)
        .collect();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].file, "rozbity.xlsx");
}

#[test]
fn test_fail_fast_precondition_aborts_without_reading() {
    let mut config = test_config();
    config.output.if_exists = IfExists::Fail;
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute("CREATE TABLE ovzdusi (id_om INTEGER)", [])
        .unwrap();

    // A file source pointing nowhere: if the pipeline tried to read it,
    // the error would be a workbook error, not the precondition.
    let sources = vec![Source::File(PathBuf::from("/nonexistent/Ovzduší 2023.xlsx"))];
    let (result, _log, stats) = run(&config, &mut conn, sources);

    match result.unwrap_err() {
        EtlError::TableExists { table } => assert_eq!(table, "ovzdusi"),
        other => panic!("expected TableExists, got {:?}", other),
    }
    assert_eq!(stats.files_processed, 0);

    // No partial mutation of the existing table.
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM ovzdusi", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_datetime_errors_logged_and_nulled() {
    let config = test_config();
    let mut conn = Connection::open_in_memory().unwrap();

    let workbook = single_sheet_workbook(vec![
        header_row(1),
        data_row(2, 1, "neznámé datum", 0.1),
        data_row(3, 2, "05.06.2021 00:00:00", 0.2),
    ]);
    let sources = vec![Source::Memory {
        label: "mereni.xlsx".to_string(),
        workbook,
    }];
    let (result, log, _stats) = run(&config, &mut conn, sources);

    result.unwrap();
    let errors: Vec<_> = log
        .records()
        .iter()
        .filter(|r| r.kind == crate::app::models::ProblemKind::DatetimeError)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, Some(2));
    assert_eq!(errors[0].column, "datum_a_cas_mereni");
    assert_eq!(errors[0].value, "neznámé datum");

    let datum: Option<String> = conn
        .query_row(
            "SELECT datum_a_cas_mereni FROM mereni WHERE id_om = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(datum, None);
}

#[test]
fn test_overflow_nulled_with_single_problem_record() {
    let config = test_config();
    let mut conn = Connection::open_in_memory().unwrap();

    let mut bad = data_row(2, 1, "01.01.2023", 0.1);
    bad.cells[0] = text("99999999999999999999");
    let workbook = single_sheet_workbook(vec![header_row(1), bad]);
    let sources = vec![Source::Memory {
        label: "preteceni.xlsx".to_string(),
        workbook,
    }];
    let (result, log, _stats) = run(&config, &mut conn, sources);

    result.unwrap();
    let overflows: Vec<_> = log
        .records()
        .iter()
        .filter(|r| r.kind == crate::app::models::ProblemKind::ValueOverflow)
        .collect();
    assert_eq!(overflows.len(), 1);
    assert_eq!(overflows[0].file, "preteceni.xlsx");
    assert_eq!(overflows[0].column, "id_om");
    assert_eq!(overflows[0].row, Some(2));

    let id: Option<i64> = conn
        .query_row("SELECT id_om FROM preteceni", [], |row| row.get(0))
        .unwrap();
    assert_eq!(id, None);
}

#[test]
fn test_blank_rows_dropped_and_short_rows_padded() {
    let config = test_config();
    let mut conn = Connection::open_in_memory().unwrap();

    let short = Row {
        number: 3,
        cells: vec![CellValue::Int(7), text("Brno")],
    };
    let blank = Row {
        number: 4,
        cells: vec![CellValue::Null, text("   ")],
    };
    let workbook = single_sheet_workbook(vec![header_row(1), data_row(2, 1, "01.01.2023", 0.5), short, blank]);
    let sources = vec![Source::Memory {
        label: "mezery.xlsx".to_string(),
        workbook,
    }];
    let (result, _log, stats) = run(&config, &mut conn, sources);

    result.unwrap();
    assert_eq!(stats.total_rows, 2);

    let nuklid: Option<String> = conn
        .query_row("SELECT nuklid FROM mezery WHERE id_om = 7", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(nuklid, None);
}

#[test]
fn test_append_mode_accumulates_across_files() {
    let mut config = test_config();
    config.output.if_exists = IfExists::Append;
    let mut conn = Connection::open_in_memory().unwrap();

    let sources = vec![
        Source::Memory {
            label: "Mléko 2019.xlsx".to_string(),
            workbook: good_workbook(),
        },
        Source::Memory {
            label: "Mléko 2020.xlsx".to_string(),
            workbook: good_workbook(),
        },
    ];
    let (result, _log, stats) = run(&config, &mut conn, sources);

    result.unwrap();
    assert_eq!(stats.files_processed, 2);
    // Two yearly exports, one shared destination table.
    assert_eq!(stats.tables_written, 1);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM mleko", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 4);
}
