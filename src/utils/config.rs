// Configuration utilities
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub query: QueryConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Transform stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Field delimiter of raw and cleaned tables
    pub delimiter: char,
}

/// Load stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub batch_size: usize,
    /// Page cache size in KiB used while ingesting
    pub cache_size_kib: i64,
    pub default_db_file_name: String,
    pub delimiter: char,
}

/// Query stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page cache size in KiB used while aggregating
    pub cache_size_kib: i64,
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per bucket
    pub root: PathBuf,
    /// Bucket receiving cleaned tables; the request bucket when unset
    pub transformed_bucket: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig { delimiter: ',' }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            batch_size: 1000,
            cache_size_kib: 64_000,
            default_db_file_name: "data.db".to_string(),
            delimiter: ',',
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig { cache_size_kib: 2_000 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: PathBuf::from("./data"),
            transformed_bucket: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON or YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let config = match extension {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| AppError::Config(e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| AppError::Config(e.to_string()))?,
            _ => {
                return Err(AppError::Config(format!(
                    "Unsupported config file format: {}",
                    path.display()
                )))
            }
        };

        Ok(config)
    }

    /// Get the log level filter
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}
