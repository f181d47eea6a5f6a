// src/error.rs

//! Unified error handling for the export pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet container could not be read or written
    #[cfg(feature = "xlsm")]
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Column contract is malformed or incomplete
    #[error("Contract error in '{contract}': {message}")]
    Contract { contract: String, message: String },

    /// Vendor template workbook is missing or unusable
    #[error("Template error: {0}")]
    Template(String),

    /// A record does not have the contract's column count
    #[error("Row {row} has {actual} cells, contract declares {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Text that cannot be represented in the legacy encoding
    #[error("Row {row}, column {column}: {ch:?} is not representable in {encoding}")]
    Encoding {
        row: usize,
        column: usize,
        ch: char,
        encoding: &'static str,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a contract error naming the offending contract.
    pub fn contract(contract: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Contract {
            contract: contract.into(),
            message: message.to_string(),
        }
    }

    /// Create a template error.
    pub fn template(message: impl fmt::Display) -> Self {
        Self::Template(message.to_string())
    }
}
