// API request and response models
// Author: Gabriel Demetrios Lafis

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::processing::{QueryParams, ResultRow};
use crate::utils::require_params;
use super::ApiError;

#[derive(Debug, Deserialize)]
struct RawTransformRequest {
    bucket_name: Option<String>,
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLoadRequest {
    bucket_name: Option<String>,
    csv_file_key: Option<String>,
    key: Option<String>,
    db_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQueryRequest {
    bucket_name: Option<String>,
    key: Option<String>,
    #[serde(rename = "Filters", default)]
    filters: Option<BTreeMap<String, String>>,
    #[serde(rename = "Group By", default)]
    group_by: Option<Vec<String>>,
}

/// Request to clean a raw table
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub bucket_name: String,
    pub key: String,
}

impl TransformRequest {
    /// Decode from an event, either flat or wrapped in a `body` field that
    /// holds an object or a JSON-encoded string
    pub fn from_event(event: &JsonValue) -> Result<Self, ApiError> {
        let params = match event.get("body") {
            Some(JsonValue::String(body)) => serde_json::from_str::<JsonValue>(body)?,
            Some(body @ JsonValue::Object(_)) => body.clone(),
            Some(_) => {
                return Err(ApiError::ValidationError(
                    "Unsupported body type in event: must be JSON string or object".to_string(),
                ))
            }
            None => event.clone(),
        };

        let raw: RawTransformRequest = serde_json::from_value(params)?;
        require_params(&[
            ("bucket_name", raw.bucket_name.as_deref()),
            ("key", raw.key.as_deref()),
        ])
        .map_err(ApiError::ValidationError)?;

        Ok(TransformRequest {
            bucket_name: raw.bucket_name.unwrap_or_default(),
            key: raw.key.unwrap_or_default(),
        })
    }
}

/// Request to build a store from a cleaned table
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub bucket_name: String,
    pub csv_file_key: String,
    pub db_file_name: String,
}

impl LoadRequest {
    /// Decode from an event. The cleaned table is named by `csv_file_key`,
    /// or by `key` when that is absent.
    pub fn from_event(event: &JsonValue, default_db_file_name: &str) -> Result<Self, ApiError> {
        let raw: RawLoadRequest = serde_json::from_value(event.clone())?;
        let csv_file_key = raw
            .csv_file_key
            .filter(|key| !key.trim().is_empty())
            .or(raw.key);

        require_params(&[
            ("bucket_name", raw.bucket_name.as_deref()),
            ("csv_file_key", csv_file_key.as_deref()),
        ])
        .map_err(ApiError::ValidationError)?;

        let db_file_name = raw
            .db_file_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_db_file_name.to_string());

        Ok(LoadRequest {
            bucket_name: raw.bucket_name.unwrap_or_default(),
            csv_file_key: csv_file_key.unwrap_or_default(),
            db_file_name,
        })
    }
}

/// Request to aggregate over a store
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub bucket_name: String,
    pub key: String,
    pub params: QueryParams,
}

impl QueryRequest {
    pub fn from_event(event: &JsonValue) -> Result<Self, ApiError> {
        let raw: RawQueryRequest = serde_json::from_value(event.clone())?;
        require_params(&[
            ("bucket_name", raw.bucket_name.as_deref()),
            ("key", raw.key.as_deref()),
        ])
        .map_err(ApiError::ValidationError)?;

        Ok(QueryRequest {
            bucket_name: raw.bucket_name.unwrap_or_default(),
            key: raw.key.unwrap_or_default(),
            params: QueryParams {
                filters: raw.filters.unwrap_or_default(),
                group_by: raw.group_by.unwrap_or_default(),
            },
        })
    }
}

/// Outcome of a stage invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failure,
}

/// Structured description of a failed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    pub message: String,
    pub kind: String,
}

/// Response returned by every stage handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescription>,
}

impl StageResponse {
    pub fn success(message: &str) -> Self {
        StageResponse {
            status: ResponseStatus::Success,
            message: message.to_string(),
            bucket_name: None,
            key: None,
            details: None,
            results: None,
            error: None,
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        StageResponse {
            status: ResponseStatus::Failure,
            message: "Stage failed".to_string(),
            bucket_name: None,
            key: None,
            details: None,
            results: None,
            error: Some(ErrorDescription {
                message: err.to_string(),
                kind: err.kind().to_string(),
            }),
        }
    }

    /// Attach the location of the produced artifact
    pub fn with_location(mut self, bucket_name: &str, key: &str) -> Self {
        self.bucket_name = Some(bucket_name.to_string());
        self.key = Some(key.to_string());
        self
    }

    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn with_results(mut self, results: Vec<ResultRow>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
