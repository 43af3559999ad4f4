// Local directory artifact store
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{ArtifactStore, StorageError};

/// Artifact store backed by a local directory, one sub-directory per bucket
pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    /// Create a new local artifact store
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }

        Ok(LocalArtifactStore { base_dir })
    }

    /// Root directory of the store
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path for an artifact
    fn get_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        check_relative(bucket)?;
        check_relative(key)?;

        let mut path = self.base_dir.clone();
        path.push(bucket);
        path.push(key);
        Ok(path)
    }
}

/// Reject empty, absolute or parent-relative locations
fn check_relative(location: &str) -> Result<(), StorageError> {
    if location.is_empty() {
        return Err(StorageError::InvalidKey(location.to_string()));
    }

    let escapes = Path::new(location).components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });

    if escapes {
        return Err(StorageError::InvalidKey(location.to_string()));
    }

    Ok(())
}

impl ArtifactStore for LocalArtifactStore {
    fn input_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let path = self.get_path(bucket, key)?;

        if !path.is_file() {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        Ok(path)
    }

    fn output_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let path = self.get_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(path)
    }
}
