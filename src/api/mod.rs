// API module: request decoding and stage handlers
// Author: Gabriel Demetrios Lafis

mod handlers;
mod models;

pub use handlers::*;
pub use models::*;

use thiserror::Error;

use crate::processing::ProcessingError;
use crate::storage::StorageError;

/// Represents an error in the API module
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ValidationError(String),

    #[error("Malformed request: {0}")]
    RequestError(#[from] serde_json::Error),

    #[error("{0}")]
    ProcessingError(#[from] ProcessingError),

    #[error("{0}")]
    StorageError(#[from] StorageError),
}

impl ApiError {
    /// Short machine-readable name of the error
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::RequestError(_) => "RequestError",
            ApiError::ProcessingError(err) => err.kind(),
            ApiError::StorageError(err) => err.kind(),
        }
    }
}
