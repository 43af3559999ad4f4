// Storage module: artifact locations and the embedded order store
// Author: Gabriel Demetrios Lafis

mod file;
pub mod sqlite;

pub use file::*;

use std::path::PathBuf;

use thiserror::Error;

/// Resolves pipeline artifacts to local files.
///
/// Stages only ever read and write local paths; fetching from or publishing
/// to a remote object store is the implementor's business.
pub trait ArtifactStore {
    /// Local path of an existing input artifact
    fn input_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError>;

    /// Local path an output artifact should be written to
    fn output_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError>;
}

/// Represents an error in the storage module
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Artifact '{bucket}/{key}' not found")]
    NotFound { bucket: String, key: String },

    #[error("Invalid artifact location '{0}'")]
    InvalidKey(String),
}

impl StorageError {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::IoError(_) => "IoError",
            StorageError::NotFound { .. } => "NotFound",
            StorageError::InvalidKey(_) => "InvalidKey",
        }
    }
}
