// Column layout shared by the cleaned table and the store
// Author: Gabriel Demetrios Lafis

use super::DataError;

pub const REGION: &str = "Region";
pub const COUNTRY: &str = "Country";
pub const ITEM_TYPE: &str = "Item Type";
pub const SALES_CHANNEL: &str = "Sales Channel";
pub const ORDER_PRIORITY: &str = "Order Priority";
pub const ORDER_DATE: &str = "Order Date";
pub const ORDER_ID: &str = "Order ID";
pub const SHIP_DATE: &str = "Ship Date";
pub const UNITS_SOLD: &str = "Units Sold";
pub const UNIT_PRICE: &str = "Unit Price";
pub const UNIT_COST: &str = "Unit Cost";
pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const TOTAL_COST: &str = "Total Cost";
pub const TOTAL_PROFIT: &str = "Total Profit";
pub const ORDER_PROCESSING_TIME: &str = "Order Processing Time";
pub const GROSS_MARGIN: &str = "Gross Margin";

/// Derived columns, in the order they are appended to the raw header
pub const DERIVED_COLUMNS: [&str; 2] = [ORDER_PROCESSING_TIME, GROSS_MARGIN];

/// Column type in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// SQL type name used in the DDL
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

/// One column of the cleaned table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Header name in the delimited files
    pub display_name: &'static str,
    /// Column name in the `orders` relation
    pub store_name: &'static str,
    pub column_type: ColumnType,
}

const fn column(display_name: &'static str, store_name: &'static str, column_type: ColumnType) -> Column {
    Column {
        display_name,
        store_name,
        column_type,
    }
}

/// The fixed positional layout of a cleaned row: the raw columns followed by
/// the two derived ones.
pub const CLEANED_COLUMNS: [Column; 16] = [
    column(REGION, "Region", ColumnType::Text),
    column(COUNTRY, "Country", ColumnType::Text),
    column(ITEM_TYPE, "ItemType", ColumnType::Text),
    column(SALES_CHANNEL, "SalesChannel", ColumnType::Text),
    column(ORDER_PRIORITY, "OrderPriority", ColumnType::Text),
    column(ORDER_DATE, "OrderDate", ColumnType::Text),
    column(ORDER_ID, "OrderID", ColumnType::Integer),
    column(SHIP_DATE, "ShipDate", ColumnType::Text),
    column(UNITS_SOLD, "UnitsSold", ColumnType::Integer),
    column(UNIT_PRICE, "UnitPrice", ColumnType::Real),
    column(UNIT_COST, "UnitCost", ColumnType::Real),
    column(TOTAL_REVENUE, "TotalRevenue", ColumnType::Real),
    column(TOTAL_COST, "TotalCost", ColumnType::Real),
    column(TOTAL_PROFIT, "TotalProfit", ColumnType::Real),
    column(ORDER_PROCESSING_TIME, "OrderProcessingTime", ColumnType::Integer),
    column(GROSS_MARGIN, "GrossMargin", ColumnType::Real),
];

/// Check that a cleaned header matches the positional layout exactly.
///
/// The loader binds values by position, so a reordered or renamed header
/// would silently mis-type every row. Names are compared after trimming.
pub fn validate_cleaned_header<S: AsRef<str>>(header: &[S]) -> Result<(), DataError> {
    if header.len() != CLEANED_COLUMNS.len() {
        return Err(DataError::RowShape {
            expected: CLEANED_COLUMNS.len(),
            found: header.len(),
        });
    }

    for (position, (found, column)) in header.iter().zip(CLEANED_COLUMNS.iter()).enumerate() {
        let found = found.as_ref().trim();
        if found != column.display_name {
            return Err(DataError::HeaderMismatch {
                position,
                expected: column.display_name,
                found: found.to_string(),
            });
        }
    }

    Ok(())
}

/// Find a column by header name
pub fn column_index<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    header.iter().position(|h| h.as_ref().trim() == name)
}
