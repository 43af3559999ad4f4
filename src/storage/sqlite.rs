// SQLite layout of the orders relation
// Author: Gabriel Demetrios Lafis

//! Storage profile for the `orders` relation
//!
//! Builds the DDL and insert statement from the cleaned column layout, and
//! provides the two connection profiles the pipeline uses:
//!
//! - a write profile for single-writer bulk ingestion (WAL, relaxed sync,
//!   large page cache, in-memory temp storage)
//! - a read-only profile for aggregation queries
//!
//! The write profile assumes exactly one writer and no concurrent readers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::data::{OrderRecord, CLEANED_COLUMNS};

/// Name of the relation holding cleaned orders
pub const TABLE_NAME: &str = "orders";

/// Indices created together with the relation
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX idx_orderid ON orders(OrderID)",
    "CREATE INDEX idx_region_country ON orders(Region, Country)",
    "CREATE INDEX idx_orderdate ON orders(OrderDate)",
];

/// DDL for the `orders` relation with an implicit surrogate key
pub fn create_table_sql() -> String {
    let columns: Vec<String> = CLEANED_COLUMNS
        .iter()
        .map(|c| format!("    {} {} NOT NULL", c.store_name, c.column_type.sql_type()))
        .collect();

    format!(
        "CREATE TABLE {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{}\n)",
        TABLE_NAME,
        columns.join(",\n")
    )
}

/// Parameterised insert of one record, placeholders in column order
pub fn insert_sql() -> String {
    let names: Vec<&str> = CLEANED_COLUMNS.iter().map(|c| c.store_name).collect();
    let placeholders: Vec<String> = (1..=CLEANED_COLUMNS.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE_NAME,
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Remove a store file and its WAL side files so a load starts fresh
pub fn remove_store(path: &Path) -> io::Result<()> {
    remove_if_present(path)?;
    remove_side_files(path)
}

/// Path a store is built at before it is published
pub fn scratch_path(path: &Path) -> PathBuf {
    side_file(path, ".partial")
}

/// Move a finished store over `target`, replacing any store already there
pub fn publish_store(finished: &Path, target: &Path) -> io::Result<()> {
    remove_side_files(target)?;
    fs::rename(finished, target)
}

fn remove_side_files(path: &Path) -> io::Result<()> {
    remove_if_present(&side_file(path, "-wal"))?;
    remove_if_present(&side_file(path, "-shm"))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Open a store for bulk ingestion
pub fn open_for_load(path: &Path, cache_size_kib: i64) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;

    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // Negative cache_size is interpreted by SQLite as KiB
    conn.pragma_update(None, "cache_size", -cache_size_kib.abs())?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    Ok(conn)
}

/// Open an existing store read-only for aggregation
pub fn open_for_query(path: &Path, cache_size_kib: i64) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    conn.pragma_update(None, "cache_size", -cache_size_kib.abs())?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    Ok(conn)
}

/// Create the relation and its indices as one setup transaction
pub fn create_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(&create_table_sql(), [])?;
    for sql in CREATE_INDEXES {
        tx.execute(sql, [])?;
    }
    tx.commit()
}

/// Insert a batch of records and commit it.
///
/// Returns the number of rows inserted. On error nothing from this batch is
/// committed; earlier batches are unaffected.
pub fn insert_batch(conn: &mut Connection, records: &[OrderRecord]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare_cached(&insert_sql())?;

        for record in records {
            stmt.execute(params![
                record.region,
                record.country,
                record.item_type,
                record.sales_channel,
                record.order_priority,
                record.order_date,
                record.order_id,
                record.ship_date,
                record.units_sold,
                record.unit_price,
                record.unit_cost,
                record.total_revenue,
                record.total_cost,
                record.total_profit,
                record.order_processing_time,
                record.gross_margin,
            ])?;
        }
    }

    tx.commit()?;
    Ok(records.len())
}

/// Fold the WAL back into the main file and leave a single-file store
pub fn finalize_store(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
    conn.pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get::<_, String>(0))?;
    Ok(())
}

/// Number of rows in the relation
pub fn count_orders(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
}
