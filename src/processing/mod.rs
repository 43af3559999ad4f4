// Processing module: transform, load and query engines
// Author: Gabriel Demetrios Lafis

mod transform;
mod load;
mod query;

pub use transform::*;
pub use load::*;
pub use query::*;

use thiserror::Error;

use crate::data::DataError;

/// Represents an error raised by the transform engine
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Raw header is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Delimiter '{0}' is not a single-byte character")]
    InvalidDelimiter(char),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::MissingColumn(_) => "MissingColumn",
            TransformError::InvalidDelimiter(_) => "InvalidDelimiter",
            TransformError::Csv(_) => "CsvError",
            TransformError::Io(_) => "IoError",
        }
    }
}

/// Represents an error raised by the load engine
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cleaned table header does not match the expected layout: {0}")]
    Header(DataError),

    #[error("Row {line}: {source}")]
    Row { line: u64, source: DataError },

    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("Delimiter '{0}' is not a single-byte character")]
    InvalidDelimiter(char),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Header(_) => "HeaderMismatch",
            LoadError::Row { source, .. } => source.kind(),
            LoadError::InvalidBatchSize => "InvalidBatchSize",
            LoadError::InvalidDelimiter(_) => "InvalidDelimiter",
            LoadError::Csv(_) => "CsvError",
            LoadError::Store(_) => "StoreError",
            LoadError::Io(_) => "IoError",
        }
    }
}

/// Represents an error raised by the query engine
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Column name '{0}' contains no usable identifier characters")]
    InvalidColumn(String),

    #[error("Store '{0}' does not exist")]
    StoreNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidColumn(_) => "InvalidColumn",
            QueryError::StoreNotFound(_) => "StoreNotFound",
            QueryError::Store(_) => "StoreError",
        }
    }
}

/// Represents an error in the processing module
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl ProcessingError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::Transform(err) => err.kind(),
            ProcessingError::Load(err) => err.kind(),
            ProcessingError::Query(err) => err.kind(),
        }
    }
}

/// Convert a configured delimiter to the byte the csv crate expects
pub(crate) fn delimiter_byte(delimiter: char) -> Option<u8> {
    if delimiter.is_ascii() {
        Some(delimiter as u8)
    } else {
        None
    }
}
