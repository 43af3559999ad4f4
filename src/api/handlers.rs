// Stage handlers
// Author: Gabriel Demetrios Lafis

use std::fs;

use log::{error, info, warn};
use serde_json::Value as JsonValue;

use crate::processing::{transform_file, LoadEngine, ProcessingError, QueryEngine};
use crate::storage::{sqlite, ArtifactStore};
use crate::utils::PipelineConfig;
use super::{models::*, ApiError};

/// Prefix of cleaned table keys
pub const TRANSFORMED_PREFIX: &str = "transformed_";

/// Directory prefix of store keys
pub const DATABASES_PREFIX: &str = "databases/";

/// Runs one pipeline stage per call against an artifact store.
///
/// Handlers never return an error: any failure becomes a `StageResponse`
/// with status `failure` and a message/kind description.
pub struct StageHandler<'a> {
    store: &'a dyn ArtifactStore,
    config: &'a PipelineConfig,
}

impl<'a> StageHandler<'a> {
    /// Create a new stage handler
    pub fn new(store: &'a dyn ArtifactStore, config: &'a PipelineConfig) -> Self {
        StageHandler { store, config }
    }

    /// Clean a raw table into `transformed_<key>`
    pub fn handle_transform(&self, event: &JsonValue) -> StageResponse {
        info!("Transform event received: {}", event);
        respond(self.transform(event))
    }

    /// Build `databases/<db_file_name>` from a cleaned table
    pub fn handle_load(&self, event: &JsonValue) -> StageResponse {
        info!("Load event received: {}", event);
        respond(self.load(event))
    }

    /// Aggregate over a store
    pub fn handle_query(&self, event: &JsonValue) -> StageResponse {
        info!("Query event received: {}", event);
        respond(self.query(event))
    }

    fn transform(&self, event: &JsonValue) -> Result<StageResponse, ApiError> {
        let request = TransformRequest::from_event(event)?;

        let input = self.store.input_path(&request.bucket_name, &request.key)?;
        let output_bucket = self
            .config
            .storage
            .transformed_bucket
            .clone()
            .unwrap_or_else(|| request.bucket_name.clone());
        let output_key = format!("{}{}", TRANSFORMED_PREFIX, request.key);
        let output = self.store.output_path(&output_bucket, &output_key)?;

        match transform_file(&input, &output, &self.config.transform) {
            Ok(summary) => Ok(StageResponse::success("File transformed successfully")
                .with_location(&output_bucket, &output_key)
                .with_details(&summary)),
            Err(err) => {
                // A partial cleaned table must not be picked up by a later load
                if let Err(cleanup) = fs::remove_file(&output) {
                    warn!("Failed to remove partial output {}: {}", output.display(), cleanup);
                }
                Err(ProcessingError::from(err).into())
            }
        }
    }

    fn load(&self, event: &JsonValue) -> Result<StageResponse, ApiError> {
        let request = LoadRequest::from_event(event, &self.config.load.default_db_file_name)?;

        let input = self.store.input_path(&request.bucket_name, &request.csv_file_key)?;
        let output_key = format!("{}{}", DATABASES_PREFIX, request.db_file_name);
        let output = self.store.output_path(&request.bucket_name, &output_key)?;

        // Build beside the published store and swap it in only when complete
        let scratch = sqlite::scratch_path(&output);
        let engine = LoadEngine::new(self.config.load.clone());
        let result = engine.load_file(&input, &scratch).and_then(|summary| {
            sqlite::publish_store(&scratch, &output)?;
            Ok(summary)
        });

        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                if let Err(cleanup) = sqlite::remove_store(&scratch) {
                    warn!("Failed to remove partial store {}: {}", scratch.display(), cleanup);
                }
                return Err(ProcessingError::from(err).into());
            }
        };

        Ok(StageResponse::success("Database created successfully")
            .with_location(&request.bucket_name, &output_key)
            .with_details(&summary))
    }

    fn query(&self, event: &JsonValue) -> Result<StageResponse, ApiError> {
        let request = QueryRequest::from_event(event)?;

        let db_path = self.store.input_path(&request.bucket_name, &request.key)?;
        let engine = QueryEngine::new(self.config.query.clone());
        let results = engine
            .query_file(&db_path, &request.params)
            .map_err(ProcessingError::from)?;

        Ok(StageResponse::success("Query executed successfully").with_results(results))
    }
}

fn respond(result: Result<StageResponse, ApiError>) -> StageResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            error!("Stage failed ({}): {}", err.kind(), err);
            StageResponse::failure(&err)
        }
    }
}
