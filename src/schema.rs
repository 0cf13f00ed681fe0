use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text that identifies the header row of a financial statement sheet.
pub const HEADER_MARKER: &str = "KONTO/BESKRIVNING";

/// Canonical name of the label column after header detection.
pub const LABEL_COLUMN: &str = "Kategori";

/// Canonical name of the grand-total column.
pub const TOTAL_COLUMN: &str = "Totalt";

/// Calendar months in column order, paired with their Swedish column abbreviation.
pub const MONTHS: [(Month, &str); 12] = [
    (Month::January, "Jan"),
    (Month::February, "Feb"),
    (Month::March, "Mar"),
    (Month::April, "Apr"),
    (Month::May, "Maj"),
    (Month::June, "Jun"),
    (Month::July, "Jul"),
    (Month::August, "Aug"),
    (Month::September, "Sep"),
    (Month::October, "Okt"),
    (Month::November, "Nov"),
    (Month::December, "Dec"),
];

/// Value column names assigned positionally after the label column.
pub const VALUE_COLUMNS: [&str; 13] = [
    "Jan", "Feb", "Mar", "Apr", "Maj", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dec", TOTAL_COLUMN,
];

pub fn month_label(month: Month) -> &'static str {
    MONTHS[month_index(month)].1
}

/// 0-based position of the month within the calendar year.
pub fn month_index(month: Month) -> usize {
    month.number_from_month() as usize - 1
}

/// A single spreadsheet cell as read from the workbook.
///
/// Text cells are kept verbatim so the presentation layer can show the exact
/// source formatting (`"1 234,5"`); numeric parsing happens on demand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One sheet of the workbook with canonical column names, before any cleaning.
///
/// Column 0 is the label column. Row order is significant: it is the only way
/// summary rows are told apart from the detail rows they summarise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Position of the detected header row within the source sheet, if the
    /// header marker was found.
    pub header_row: Option<usize>,
}

impl RawSheet {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// The row label, empty when the label cell is blank.
    pub fn label(&self, row: usize) -> String {
        match self.cell(row, 0) {
            Some(cell) if !cell.is_blank() => cell.to_string(),
            _ => String::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// The `Totalt` column, falling back to the last column of the table.
    pub fn total_column(&self) -> Option<usize> {
        self.column_index(TOTAL_COLUMN)
            .or_else(|| self.columns.len().checked_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRow {
    pub key: String,
    pub values: Vec<Option<f64>>,
}

/// The cleaned numeric form of a sheet, keyed by row label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSheet {
    pub name: String,
    pub key_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<ProcessedRow>,
}

impl ProcessedSheet {
    /// (rows, value columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// First row with the given key. Keys are not guaranteed to be unique.
    pub fn row(&self, key: &str) -> Option<&ProcessedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.row(key)?.values.get(idx).copied().flatten()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }
}
