use thiserror::Error;

/// Failure while reading, normalizing or writing a record table.
///
/// Every variant is fatal for the whole file; there is no row-level recovery.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Column '{0}' not found in uploaded file")]
    MissingColumn(String),

    #[error("Column '{column}', row {row}: cannot parse date '{value}'")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}', row {row}: '{value}' is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("File has no header row")]
    EmptyFile,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CleanResult<T> = Result<T, CleanError>;
