use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("Failed to download dataset: {0}")]
    Download(#[from] reqwest::Error),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("Inconsistent column count: row {row} has {actual} columns, expected {expected}")]
    InconsistentColumns { row: usize, actual: usize, expected: usize },

    #[error("CSV is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid numeric value '{value}' in column '{column}' at row {row}: {source}")]
    InvalidNumeric {
        column: &'static str,
        value: String,
        row: usize,
        source: std::num::ParseFloatError,
    },

    #[error("Invalid integer value '{value}' in column '{column}' at row {row}: {source}")]
    InvalidInteger {
        column: &'static str,
        value: String,
        row: usize,
        source: std::num::ParseIntError,
    },

    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),
}
