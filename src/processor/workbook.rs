//! Workbook reading.
//!
//! Reads an XLSX file into a plain in-memory grid of [`CellValue`]s. Row
//! numbers are 1-based Excel numbers so that diagnostics point at what
//! the user sees when they open the file.

use crate::app::models::CellValue;
use crate::error::EtlError;
use crate::Result;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// One cell row with its 1-based Excel row number.
#[derive(Debug, Clone)]
pub struct Row {
    pub number: u32,
    pub cells: Vec<CellValue>,
}

/// One sheet, rows in top-down order.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// A fully loaded workbook, sheets in file order.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Load every sheet of an XLSX file into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut xlsx: Xlsx<BufReader<File>> = open_workbook(path)
            .map_err(|e: calamine::XlsxError| EtlError::workbook(path, e.to_string()))?;

        let sheet_names = xlsx.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for name in sheet_names {
            let range = xlsx
                .worksheet_range(&name)
                .map_err(|e| EtlError::workbook(path, format!("sheet '{}': {}", name, e)))?;

            let first_row = range.start().map(|(row, _)| row).unwrap_or(0);
            let rows = range
                .rows()
                .enumerate()
                .map(|(i, cells)| Row {
                    number: first_row + i as u32 + 1,
                    cells: cells.iter().map(convert_cell).collect(),
                })
                .collect();

            sheets.push(Sheet { name, rows });
        }

        debug!(path = %path.display(), sheets = sheets.len(), "Loaded workbook");
        Ok(Self { sheets })
    }
}

/// Map a calamine cell into the pipeline's value model.
///
/// Native spreadsheet datetimes become `CellValue::DateTime` when the
/// serial decodes cleanly, otherwise the raw serial is kept as a number
/// for the serial-date fallback to interpret. Cell-level spreadsheet
/// errors (`#N/A` and friends) carry no data and become null.
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Real(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(excel_dt) => match excel_dt.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Real(excel_dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Null,
    }
}

/// Date of the spreadsheet serial epoch, exposed for tests that construct
/// serial values.
#[cfg(test)]
pub fn serial_epoch() -> chrono::NaiveDate {
    let (y, m, d) = crate::constants::SERIAL_EPOCH_YMD;
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
