// Transform engine tests
// Author: Gabriel Demetrios Lafis

use sales_pipeline::{
    processing::{clean_lines, transform_stream, TransformEngine, TransformError},
    utils::TransformConfig,
};

const RAW_HEADER: &str = "Region,Country,Item Type,Sales Channel,Order Priority,Order Date,Order ID,Ship Date,Units Sold,Unit Price,Unit Cost,Total Revenue,Total Cost,Total Profit";

fn raw_row(region: &str, priority: &str, order_id: &str, order_date: &str, ship_date: &str, revenue: &str, profit: &str) -> String {
    format!(
        "{},Japan,Cereal,Online,{},{},{},{},10,2.5,1.5,{},15,{}",
        region, priority, order_date, order_id, ship_date, revenue, profit
    )
}

fn run(lines: Vec<String>) -> Vec<String> {
    clean_lines(lines, &TransformConfig::default())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn cells(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

#[test]
fn test_cleaned_header_appends_derived_columns() {
    let output = run(vec![RAW_HEADER.to_string()]);

    assert_eq!(output.len(), 1);
    assert_eq!(
        output[0],
        format!("{},Order Processing Time,Gross Margin", RAW_HEADER)
    );
}

#[test]
fn test_first_occurrence_of_order_id_wins() {
    // Three rows share order id 7 at positions 1, 3 and 5
    let lines = vec![
        RAW_HEADER.to_string(),
        raw_row("Asia", "H", "7", "01/01/2023", "01/10/2023", "25", "10"),
        raw_row("Europe", "L", "8", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Africa", "M", "7", "01/01/2023", "01/03/2023", "25", "10"),
        raw_row("Europe", "L", "9", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Oceania", "C", "7", "01/01/2023", "01/04/2023", "25", "10"),
    ];

    let output = run(lines);

    assert_eq!(output.len(), 4);
    let ids: Vec<&str> = output[1..].iter().map(|l| cells(l)[6]).collect();
    assert_eq!(ids, vec!["7", "8", "9"]);
    assert_eq!(cells(&output[1])[0], "Asia");
}

#[test]
fn test_priority_mapping() {
    let lines = vec![
        RAW_HEADER.to_string(),
        raw_row("Asia", "L", "1", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Asia", "M", "2", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Asia", "H", "3", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Asia", "C", "4", "01/01/2023", "01/02/2023", "25", "10"),
        raw_row("Asia", "X", "5", "01/01/2023", "01/02/2023", "25", "10"),
    ];

    let output = run(lines);

    let labels: Vec<&str> = output[1..].iter().map(|l| cells(l)[4]).collect();
    assert_eq!(labels, vec!["Low", "Medium", "High", "Critical", "Unknown"]);
}

#[test]
fn test_derived_columns() {
    let lines = vec![
        RAW_HEADER.to_string(),
        raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10"),
        raw_row("Asia", "H", "2", "not-a-date", "01/10/2023", "25", "10"),
        raw_row("Asia", "H", "3", "01/01/2023", "01/10/2023", "0", "50"),
        raw_row("Asia", "H", "4", "01/01/2023", "01/10/2023", "n/a", "50"),
    ];

    let output = run(lines);
    assert_eq!(output.len(), 5);

    let first = cells(&output[1]);
    assert_eq!(first.len(), 16);
    assert_eq!(first[14], "9");
    assert_eq!(first[15], "0.4");

    // Unparsable order date falls back to zero days
    assert_eq!(cells(&output[2])[14], "0");
    // Zero or non-numeric revenue falls back to zero margin
    assert_eq!(cells(&output[3])[15], "0");
    assert_eq!(cells(&output[4])[15], "0");
}

#[test]
fn test_short_rows_are_skipped() {
    let lines = vec![
        RAW_HEADER.to_string(),
        "Asia,Japan,Cereal".to_string(),
        String::new(),
        raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10"),
    ];

    let mut cleaned = clean_lines(lines, &TransformConfig::default());
    let output: Vec<String> = cleaned.by_ref().map(|l| l.unwrap()).collect();

    assert_eq!(output.len(), 2);
    let summary = cleaned.summary().unwrap();
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.malformed_skipped, 2);
}

#[test]
fn test_missing_business_key_column() {
    let lines = vec![
        "Region,Country,Order Date".to_string(),
        "Asia,Japan,01/01/2023".to_string(),
    ];

    let mut cleaned = clean_lines(lines, &TransformConfig::default());

    match cleaned.next() {
        Some(Err(TransformError::MissingColumn(column))) => assert_eq!(column, "Order ID"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.is_ok())),
    }
    assert!(cleaned.next().is_none());
}

#[test]
fn test_missing_derivation_column_drops_rows() {
    let mut engine = TransformEngine::new(&["Order ID", "Order Date", "Ship Date"]).unwrap();

    assert!(engine.transform_row(&["1", "01/01/2023", "01/02/2023"]).is_none());
    assert_eq!(engine.summary().malformed_skipped, 1);
}

#[test]
fn test_engines_do_not_share_seen_keys() {
    let lines = || {
        vec![
            RAW_HEADER.to_string(),
            raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10"),
        ]
    };

    assert_eq!(run(lines()).len(), 2);
    assert_eq!(run(lines()).len(), 2);
}

#[test]
fn test_transform_is_not_idempotent() {
    let first = run(vec![
        RAW_HEADER.to_string(),
        raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10"),
    ]);
    let second = run(first.clone());

    // Derived columns are appended a second time and the label is re-mapped
    assert_eq!(cells(&second[0]).len(), 18);
    assert_eq!(cells(&second[1])[4], "Unknown");
    assert_ne!(first, second);
}

#[test]
fn test_transform_stream_keeps_quoted_cells() {
    let raw = format!(
        "{}\nAsia,\"Korea, South\",Cereal,Online,H,01/01/2023,1,01/10/2023,10,2.5,1.5,25,15,10\n{}\n",
        RAW_HEADER,
        raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10"),
    );

    let mut output = Vec::new();
    let summary = transform_stream(raw.as_bytes(), &mut output, &TransformConfig::default()).unwrap();
    let output = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("Asia,\"Korea, South\",Cereal,Online,High,"));
    assert!(lines[1].ends_with(",9,0.4"));
}

#[test]
fn test_transform_stream_empty_input() {
    let mut output = Vec::new();
    let summary = transform_stream("".as_bytes(), &mut output, &TransformConfig::default()).unwrap();

    assert_eq!(summary.rows_read, 0);
    assert!(output.is_empty());
}

#[test]
fn test_trailing_delimiter_keeps_row() {
    let row = raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10");
    let lines = vec![
        RAW_HEADER.to_string(),
        format!("{},", row),
        format!("{},,", raw_row("Asia", "L", "2", "01/01/2023", "01/10/2023", "25", "10")),
    ];

    let mut cleaned = clean_lines(lines, &TransformConfig::default());
    let output: Vec<String> = cleaned.by_ref().map(|l| l.unwrap()).collect();

    assert_eq!(output.len(), 3);
    let first = cells(&output[1]);
    assert_eq!(first.len(), 16);
    assert_eq!(first[4], "High");
    assert_eq!(first[14], "9");
    assert_eq!(first[15], "0.4");
    assert_eq!(cleaned.summary().unwrap().malformed_skipped, 0);
}

#[test]
fn test_non_empty_extra_cell_drops_row() {
    let lines = vec![
        RAW_HEADER.to_string(),
        format!("{},extra", raw_row("Asia", "H", "1", "01/01/2023", "01/10/2023", "25", "10")),
    ];

    let mut cleaned = clean_lines(lines, &TransformConfig::default());
    let output: Vec<String> = cleaned.by_ref().map(|l| l.unwrap()).collect();

    assert_eq!(output.len(), 1);
    assert_eq!(cleaned.summary().unwrap().malformed_skipped, 1);
}

#[test]
fn test_transform_stream_trailing_delimiter() {
    let raw = format!(
        "{}\n{},\n",
        RAW_HEADER,
        raw_row("Asia", "C", "1", "01/01/2023", "01/10/2023", "25", "10"),
    );

    let mut output = Vec::new();
    let summary = transform_stream(raw.as_bytes(), &mut output, &TransformConfig::default()).unwrap();
    let output = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(summary.rows_written, 1);
    assert_eq!(lines.len(), 2);
    assert_eq!(cells(lines[1]).len(), 16);
    assert!(lines[1].ends_with(",Critical,01/01/2023,1,01/10/2023,10,2.5,1.5,25,15,10,9,0.4"));
}
