// Order record model and field parsing rules
// Author: Gabriel Demetrios Lafis

use std::fmt;

use chrono::NaiveDate;

use super::{ColumnType, DataError, CLEANED_COLUMNS};

/// Textual date format used by both date columns
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Order priority, mapped from the single-letter code found in raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Priority {
    /// Map a raw priority code. Anything outside L/M/H/C is `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "L" => Priority::Low,
            "M" => Priority::Medium,
            "H" => Priority::High,
            "C" => Priority::Critical,
            _ => Priority::Unknown,
        }
    }

    /// Label written to the cleaned table
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
            Priority::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a date in `MM/DD/YYYY` form
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Whole days between order and ship date, or 0 when either fails to parse
pub fn processing_days(order_date: &str, ship_date: &str) -> i64 {
    match (parse_date(order_date), parse_date(ship_date)) {
        (Some(order), Some(ship)) => (ship - order).num_days(),
        _ => 0,
    }
}

fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Profit over revenue.
///
/// Zero revenue yields 0, and so does a value in either column that is not
/// a finite decimal.
pub fn gross_margin(total_profit: &str, total_revenue: &str) -> f64 {
    match (parse_decimal(total_profit), parse_decimal(total_revenue)) {
        (Some(profit), Some(revenue)) if revenue != 0.0 => profit / revenue,
        _ => 0.0,
    }
}

/// Render a gross margin for the cleaned table
pub fn format_margin(margin: f64) -> String {
    if margin == 0.0 {
        "0".to_string()
    } else {
        margin.to_string()
    }
}

/// One cleaned sales transaction, as bound into the `orders` relation
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub region: String,
    pub country: String,
    pub item_type: String,
    pub sales_channel: String,
    pub order_priority: String,
    pub order_date: String,
    pub order_id: i64,
    pub ship_date: String,
    pub units_sold: i64,
    pub unit_price: f64,
    pub unit_cost: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub order_processing_time: i64,
    pub gross_margin: f64,
}

impl OrderRecord {
    /// Build a record from the cells of one cleaned row.
    ///
    /// Cells are taken positionally in `CLEANED_COLUMNS` order; no header
    /// lookup happens here.
    pub fn from_cleaned_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self, DataError> {
        if cells.len() != CLEANED_COLUMNS.len() {
            return Err(DataError::RowShape {
                expected: CLEANED_COLUMNS.len(),
                found: cells.len(),
            });
        }

        let text = |i: usize| cells[i].as_ref().to_string();

        Ok(OrderRecord {
            region: text(0),
            country: text(1),
            item_type: text(2),
            sales_channel: text(3),
            order_priority: text(4),
            order_date: text(5),
            order_id: integer_cell(cells, 6)?,
            ship_date: text(7),
            units_sold: integer_cell(cells, 8)?,
            unit_price: real_cell(cells, 9)?,
            unit_cost: real_cell(cells, 10)?,
            total_revenue: real_cell(cells, 11)?,
            total_cost: real_cell(cells, 12)?,
            total_profit: real_cell(cells, 13)?,
            order_processing_time: integer_cell(cells, 14)?,
            gross_margin: real_cell(cells, 15)?,
        })
    }
}

fn integer_cell<S: AsRef<str>>(cells: &[S], index: usize) -> Result<i64, DataError> {
    debug_assert_eq!(CLEANED_COLUMNS[index].column_type, ColumnType::Integer);
    let raw = cells[index].as_ref();
    raw.trim().parse::<i64>().map_err(|_| DataError::InvalidValue {
        column: CLEANED_COLUMNS[index].display_name,
        value: raw.to_string(),
        expected: "integer",
    })
}

fn real_cell<S: AsRef<str>>(cells: &[S], index: usize) -> Result<f64, DataError> {
    debug_assert_eq!(CLEANED_COLUMNS[index].column_type, ColumnType::Real);
    let raw = cells[index].as_ref();
    raw.trim().parse::<f64>().map_err(|_| DataError::InvalidValue {
        column: CLEANED_COLUMNS[index].display_name,
        value: raw.to_string(),
        expected: "decimal",
    })
}
