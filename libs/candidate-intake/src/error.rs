//! Error types for batch decoding

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported file type '{0}'. Only json and csv are allowed.")]
    UnsupportedFormat(String),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV document: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: {field} is invalid.")]
    InvalidField { row: u64, field: &'static str },

    #[error("Header is missing required column '{0}'")]
    MissingColumn(&'static str),
}
