// Data module for the order record model
// Author: Gabriel Demetrios Lafis

mod record;
mod schema;

pub use record::*;
pub use schema::*;

use thiserror::Error;

/// Represents an error in the data module
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Row has {found} cells, expected {expected}")]
    RowShape { expected: usize, found: usize },

    #[error("Invalid value '{value}' in column '{column}': expected {expected}")]
    InvalidValue {
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Header mismatch at column {position}: expected '{expected}', found '{found}'")]
    HeaderMismatch {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Missing column '{0}'")]
    MissingColumn(String),
}

impl DataError {
    /// Short machine-readable name of the error
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::RowShape { .. } => "RowShape",
            DataError::InvalidValue { .. } => "InvalidValue",
            DataError::HeaderMismatch { .. } => "HeaderMismatch",
            DataError::MissingColumn(_) => "MissingColumn",
        }
    }
}
