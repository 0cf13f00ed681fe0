use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinancialSheetError {
    #[error("Workbook not found: {0}")]
    WorkbookNotFound(String),

    #[error("Failed to read workbook {path}: {details}")]
    WorkbookRead { path: String, details: String },

    #[error("Failed to read sheet '{sheet}': {details}")]
    SheetRead { sheet: String, details: String },

    #[error("Sheet '{0}' has no columns to process")]
    EmptySheet(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FinancialSheetError {
    /// True for errors that abort a whole workbook load.
    pub fn is_fatal_load(&self) -> bool {
        matches!(
            self,
            Self::WorkbookNotFound(_)
                | Self::WorkbookRead { .. }
                | Self::SheetRead { .. }
                | Self::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FinancialSheetError>;
