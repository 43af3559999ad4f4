// Load engine tests
// Author: Gabriel Demetrios Lafis

use std::fs;

use rusqlite::Connection;
use sales_pipeline::{
    processing::{LoadEngine, LoadError},
    storage::sqlite,
    utils::LoadConfig,
};
use tempfile::tempdir;

const CLEANED_HEADER: &str = "Region,Country,Item Type,Sales Channel,Order Priority,Order Date,Order ID,Ship Date,Units Sold,Unit Price,Unit Cost,Total Revenue,Total Cost,Total Profit,Order Processing Time,Gross Margin";

fn cleaned_row(region: &str, order_id: u32, units_sold: &str) -> String {
    format!(
        "{},Japan,Cereal,Online,High,01/01/2023,{},01/10/2023,{},2.5,1.5,25,15,10,9,0.4",
        region, order_id, units_sold
    )
}

fn cleaned_table(rows: &[String]) -> String {
    let mut table = CLEANED_HEADER.to_string();
    for row in rows {
        table.push('\n');
        table.push_str(row);
    }
    table.push('\n');
    table
}

fn engine(batch_size: usize) -> LoadEngine {
    LoadEngine::new(LoadConfig {
        batch_size,
        ..LoadConfig::default()
    })
}

#[test]
fn test_load_commits_in_batches() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let rows: Vec<String> = (1..=5).map(|i| cleaned_row("Asia", i, "10")).collect();
    let table = cleaned_table(&rows);

    let summary = engine(2).load_reader(table.as_bytes(), &db_path).unwrap();

    assert_eq!(summary.rows_loaded, 5);
    assert_eq!(summary.batches_committed, 3);

    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(sqlite::count_orders(&conn).unwrap(), 5);
}

#[test]
fn test_load_stores_typed_values() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let table = cleaned_table(&[cleaned_row("Asia", 1001, "10")]);
    engine(1000).load_reader(table.as_bytes(), &db_path).unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let (order_id, units, margin, priority): (i64, i64, f64, String) = conn
        .query_row(
            "SELECT OrderID, UnitsSold, GrossMargin, OrderPriority FROM orders",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();

    assert_eq!(order_id, 1001);
    assert_eq!(units, 10);
    assert_eq!(margin, 0.4);
    assert_eq!(priority, "High");
}

#[test]
fn test_load_creates_indices_and_single_file_store() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let table = cleaned_table(&[cleaned_row("Asia", 1, "10")]);
    engine(1000).load_reader(table.as_bytes(), &db_path).unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let indices: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'orders'")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert!(indices.contains(&"idx_orderid".to_string()));
    assert!(indices.contains(&"idx_region_country".to_string()));
    assert!(indices.contains(&"idx_orderdate".to_string()));

    let journal: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal.to_lowercase(), "delete");
    assert!(!dir.path().join("data.db-wal").exists());
}

#[test]
fn test_load_replaces_existing_store() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");
    fs::write(&db_path, b"not a database").unwrap();

    let rows: Vec<String> = (1..=3).map(|i| cleaned_row("Asia", i, "10")).collect();
    engine(1000).load_reader(cleaned_table(&rows).as_bytes(), &db_path).unwrap();

    // A second load starts from scratch rather than appending
    engine(1000).load_reader(cleaned_table(&rows).as_bytes(), &db_path).unwrap();

    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(sqlite::count_orders(&conn).unwrap(), 3);
}

#[test]
fn test_bad_numeric_value_fails_its_batch_only() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let mut rows: Vec<String> = (1..=4).map(|i| cleaned_row("Asia", i, "10")).collect();
    rows.push(cleaned_row("Asia", 5, "many"));
    let table = cleaned_table(&rows);

    match engine(2).load_reader(table.as_bytes(), &db_path) {
        Err(LoadError::Row { line, source }) => {
            assert_eq!(line, 6);
            assert!(source.to_string().contains("Units Sold"));
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // The two full batches before the failure remain committed
    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(sqlite::count_orders(&conn).unwrap(), 4);
}

#[test]
fn test_partial_batch_is_never_committed() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let rows = vec![
        cleaned_row("Asia", 1, "10"),
        cleaned_row("Asia", 2, "10"),
        cleaned_row("Asia", 3, "10"),
        cleaned_row("Asia", 4, "ten"),
    ];

    assert!(engine(3).load_reader(cleaned_table(&rows).as_bytes(), &db_path).is_err());

    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(sqlite::count_orders(&conn).unwrap(), 3);
}

#[test]
fn test_header_mismatch_is_rejected_before_creating_store() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let header = CLEANED_HEADER.replace("Region,Country", "Country,Region");
    let table = format!("{}\n{}\n", header, cleaned_row("Asia", 1, "10"));

    match engine(1000).load_reader(table.as_bytes(), &db_path) {
        Err(LoadError::Header(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!db_path.exists());
}

#[test]
fn test_row_with_wrong_cell_count_is_rejected() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");

    let table = format!("{}\nAsia,Japan,Cereal\n", CLEANED_HEADER);

    match engine(1000).load_reader(table.as_bytes(), &db_path) {
        Err(err @ LoadError::Row { .. }) => assert_eq!(err.kind(), "RowShape"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data.db");
    let table = cleaned_table(&[cleaned_row("Asia", 1, "10")]);

    assert!(matches!(
        engine(0).load_reader(table.as_bytes(), &db_path),
        Err(LoadError::InvalidBatchSize)
    ));
}
