use crate::error::{FinancialSheetError, Result};
use crate::schema::{
    Cell, ProcessedRow, ProcessedSheet, RawSheet, HEADER_MARKER, LABEL_COLUMN, VALUE_COLUMNS,
};
use crate::utils::parse_decimal_comma;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// A sheet that was read but could not be cleaned, and is left out of all queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSheet {
    pub name: String,
    pub reason: String,
}

/// All sheets of a workbook in their raw form, in workbook order.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub source: Option<String>,
    pub sheets: Vec<RawSheet>,
}

impl Workbook {
    /// Reads every sheet of the workbook at `path` (xlsx, xlsm, xlsb, xls or ods).
    ///
    /// Any failure aborts the whole load; there is no partially loaded workbook.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(FinancialSheetError::WorkbookNotFound(
                path.display().to_string(),
            ));
        }

        let mut workbook =
            open_workbook_auto(path).map_err(|e| FinancialSheetError::WorkbookRead {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            source: Some(path.display().to_string()),
            sheets: read_sheets(&mut workbook)?,
        })
    }

    /// Reads a workbook already held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
            FinancialSheetError::WorkbookRead {
                path: "<memory>".to_string(),
                details: e.to_string(),
            }
        })?;

        Ok(Self {
            source: None,
            sheets: read_sheets(&mut workbook)?,
        })
    }

    /// Builds a workbook from ranges that were read elsewhere.
    pub fn from_ranges(ranges: Vec<(String, Range<Data>)>) -> Self {
        Self {
            source: None,
            sheets: ranges
                .iter()
                .map(|(name, range)| ingest_range(name, range))
                .collect(),
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn read_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<RawSheet>> {
    let names = workbook.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range =
            workbook
                .worksheet_range(&name)
                .map_err(|e| FinancialSheetError::SheetRead {
                    sheet: name.clone(),
                    details: e.to_string(),
                })?;
        sheets.push(ingest_range(&name, &range));
    }

    Ok(sheets)
}

pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

pub fn ingest_range(name: &str, range: &Range<Data>) -> RawSheet {
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    ingest_grid(name, grid)
}

/// Turns a grid of cells into a [`RawSheet`] with canonical column names.
///
/// When a row whose first cell contains `KONTO/BESKRIVNING` exists, that row is
/// the header and its columns are renamed to `Kategori`, the twelve months and
/// `Totalt`. Otherwise the first row is used as the header as-is.
pub fn ingest_grid(name: &str, grid: Vec<Vec<Cell>>) -> RawSheet {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let rows: Vec<Vec<Cell>> = grid
        .into_iter()
        .map(|mut row| {
            row.resize(width, Cell::Empty);
            row
        })
        .collect();

    let header_row = locate_header_row(&rows);
    let (header_idx, columns) = match header_row {
        Some(idx) => {
            debug!("Sheet '{}': header marker found at row {}", name, idx);
            (idx, canonical_columns(&rows[idx]))
        }
        None => {
            debug!(
                "Sheet '{}': no {} row, using first row as header",
                name, HEADER_MARKER
            );
            (0, verbatim_columns(rows.first().map(Vec::as_slice).unwrap_or(&[])))
        }
    };

    RawSheet {
        name: name.to_string(),
        columns,
        rows: rows.into_iter().skip(header_idx + 1).collect(),
        header_row,
    }
}

/// Index of the first row whose first cell contains the header marker.
pub fn locate_header_row(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter().position(|row| {
        row.first()
            .is_some_and(|cell| cell.to_string().contains(HEADER_MARKER))
    })
}

/// Renames header cells positionally. Columns past `Totalt` keep their own text.
pub fn canonical_columns(header: &[Cell]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match idx {
            0 => LABEL_COLUMN.to_string(),
            i if i <= VALUE_COLUMNS.len() => VALUE_COLUMNS[i - 1].to_string(),
            i => header_name(i, cell),
        })
        .collect()
}

fn verbatim_columns(header: &[Cell]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(idx, cell))
        .collect()
}

fn header_name(idx: usize, cell: &Cell) -> String {
    if cell.is_blank() {
        format!("Unnamed: {}", idx)
    } else {
        cell.to_string()
    }
}

/// Produces the numeric form of a sheet.
///
/// Rows with a blank label (which includes fully blank rows) are dropped, the
/// label becomes the row key and every other cell is parsed with decimal
/// commas read as points. Unparseable cells become `None`.
pub fn clean_sheet(raw: &RawSheet) -> Result<ProcessedSheet> {
    if raw.columns.is_empty() {
        return Err(FinancialSheetError::EmptySheet(raw.name.clone()));
    }

    let rows: Vec<ProcessedRow> = raw
        .rows
        .iter()
        .filter(|row| !row.iter().all(Cell::is_blank))
        .filter(|row| row.first().is_some_and(|label| !label.is_blank()))
        .map(|row| ProcessedRow {
            key: row[0].to_string(),
            values: (1..raw.width())
                .map(|col| row.get(col).and_then(parse_decimal_comma))
                .collect(),
        })
        .collect();

    let processed = ProcessedSheet {
        name: raw.name.clone(),
        key_column: raw.columns[0].clone(),
        columns: raw.columns[1..].to_vec(),
        rows,
    };

    debug!(
        "Processed sheet '{}': {} rows, {} columns",
        processed.name,
        processed.rows.len(),
        processed.columns.len()
    );

    Ok(processed)
}
