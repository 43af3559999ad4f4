// Load engine: batched transactional ingestion of a cleaned table
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::data::{validate_cleaned_header, OrderRecord};
use crate::storage::sqlite;
use crate::utils::LoadConfig;
use super::{delimiter_byte, LoadError};

/// Outcome of one load pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows_loaded: u64,
    pub batches_committed: u64,
}

/// Builds a fresh `orders` store from a cleaned table.
///
/// Values are bound by position, so the cleaned header must match the fixed
/// 16-column layout before anything is created. Rows are committed in
/// batches: a row that fails to parse fails its batch, and every batch
/// committed before it stays in the store. A failed load can therefore leave
/// a partially populated relation, never a partially inserted batch.
pub struct LoadEngine {
    config: LoadConfig,
}

impl LoadEngine {
    /// Create a new load engine
    pub fn new(config: LoadConfig) -> Self {
        LoadEngine { config }
    }

    /// Load a cleaned table file into a new store at `db_path`
    pub fn load_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        csv_path: P,
        db_path: Q,
    ) -> Result<LoadSummary, LoadError> {
        info!(
            "Loading {} into {}",
            csv_path.as_ref().display(),
            db_path.as_ref().display()
        );

        let reader = BufReader::new(File::open(csv_path)?);
        self.load_reader(reader, db_path)
    }

    /// Load a cleaned table stream into a new store at `db_path`
    pub fn load_reader<R: Read, P: AsRef<Path>>(
        &self,
        reader: R,
        db_path: P,
    ) -> Result<LoadSummary, LoadError> {
        let db_path = db_path.as_ref();
        let batch_size = self.config.batch_size;
        if batch_size == 0 {
            return Err(LoadError::InvalidBatchSize);
        }

        let delimiter = delimiter_byte(self.config.delimiter)
            .ok_or(LoadError::InvalidDelimiter(self.config.delimiter))?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        validate_cleaned_header(&header).map_err(LoadError::Header)?;

        sqlite::remove_store(db_path)?;
        let mut conn = sqlite::open_for_load(db_path, self.config.cache_size_kib)?;
        sqlite::create_schema(&mut conn)?;

        let mut summary = LoadSummary::default();
        let mut batch: Vec<OrderRecord> = Vec::with_capacity(batch_size);

        for result in csv_reader.records() {
            let record = result?;
            // 1-based file line, header included
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let cells: Vec<&str> = record.iter().collect();
            let order = OrderRecord::from_cleaned_cells(&cells)
                .map_err(|source| LoadError::Row { line, source })?;
            batch.push(order);

            if batch.len() >= batch_size {
                self.commit_batch(&mut conn, &mut batch, &mut summary)?;
            }
        }

        if !batch.is_empty() {
            self.commit_batch(&mut conn, &mut batch, &mut summary)?;
        }

        sqlite::finalize_store(&conn)?;

        info!(
            "Loaded {} rows in {} batches into {}",
            summary.rows_loaded,
            summary.batches_committed,
            db_path.display()
        );

        Ok(summary)
    }

    fn commit_batch(
        &self,
        conn: &mut rusqlite::Connection,
        batch: &mut Vec<OrderRecord>,
        summary: &mut LoadSummary,
    ) -> Result<(), LoadError> {
        let inserted = sqlite::insert_batch(conn, batch)?;
        batch.clear();

        summary.rows_loaded += inserted as u64;
        summary.batches_committed += 1;
        debug!(
            "Committed batch {} ({} rows total)",
            summary.batches_committed, summary.rows_loaded
        );

        Ok(())
    }
}
