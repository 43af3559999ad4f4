// Sales Pipeline
// Author: Gabriel Demetrios Lafis

//! # Sales Pipeline
//!
//! A three-stage batch pipeline for tabular sales records.
//!
//! ## Stages
//!
//! - **Transform**: deduplicate raw rows by order id, map priority codes to
//!   labels and derive processing time and gross margin
//! - **Load**: build a fresh SQLite `orders` relation with indices, inserting
//!   in committed batches
//! - **Query**: grouped aggregation with identifier allow-listing and bound
//!   filter values
//!
//! Stages share no process state; each one hands the next a file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sales_pipeline::{
//!     processing::{transform_file, LoadEngine, QueryEngine, QueryParams},
//!     utils::PipelineConfig,
//! };
//!
//! let config = PipelineConfig::default();
//!
//! transform_file("sales.csv", "transformed_sales.csv", &config.transform).unwrap();
//!
//! LoadEngine::new(config.load.clone())
//!     .load_file("transformed_sales.csv", "data.db")
//!     .unwrap();
//!
//! let params = QueryParams::new()
//!     .filter("Region", "Sub-Saharan Africa")
//!     .group_by("Country");
//! let rows = QueryEngine::new(config.query.clone())
//!     .query_file("data.db", &params)
//!     .unwrap();
//!
//! for row in rows {
//!     println!("{} -> {}", row["Country"], row["Total Revenue"]);
//! }
//! ```

pub mod data;
pub mod processing;
pub mod storage;
pub mod api;
pub mod utils;

// Re-export main types
pub use data::{OrderRecord, Priority};
pub use processing::{LoadEngine, QueryEngine, QueryParams, TransformEngine};
pub use storage::{ArtifactStore, LocalArtifactStore};
pub use api::{StageHandler, StageResponse};
pub use utils::PipelineConfig;
