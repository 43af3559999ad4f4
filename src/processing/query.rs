// Query engine: grouped aggregation over the orders store
// Author: Gabriel Demetrios Lafis

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use rusqlite::{params_from_iter, Connection};

use crate::storage::sqlite;
use crate::utils::QueryConfig;
use super::QueryError;

/// One output group: metric and group-column display names to text values
pub type ResultRow = BTreeMap<String, String>;

/// Display names of the nine fixed metrics, in projection order
pub const METRIC_NAMES: [&str; 9] = [
    "Average Order Processing Time in days",
    "Average Gross Margin",
    "Average Units Sold",
    "Max Units Sold",
    "Min Units Sold",
    "Total Units Sold",
    "Total Revenue",
    "Total Profit",
    "Number of Orders",
];

/// Position of the distinct order count in the projection
const ORDER_COUNT_INDEX: usize = 8;

const METRICS_PROJECTION: &str = "\
CAST(ROUND(AVG(CAST(OrderProcessingTime AS REAL)), 2) AS TEXT), \
CAST(ROUND(AVG(CAST(GrossMargin AS REAL)), 4) AS TEXT), \
CAST(ROUND(AVG(CAST(UnitsSold AS REAL)), 2) AS TEXT), \
CAST(MAX(UnitsSold) AS TEXT), \
CAST(MIN(UnitsSold) AS TEXT), \
CAST(SUM(UnitsSold) AS TEXT), \
CAST(ROUND(SUM(TotalRevenue), 2) AS TEXT), \
CAST(ROUND(SUM(TotalProfit), 2) AS TEXT), \
CAST(COUNT(DISTINCT OrderID) AS TEXT)";

/// Untyped query input: equality filters and group-by columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub filters: BTreeMap<String, String>,
    pub group_by: Vec<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    pub fn filter(mut self, column: &str, value: &str) -> Self {
        self.filters.insert(column.to_string(), value.to_string());
        self
    }

    /// Add a group-by column
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }
}

/// A built statement and the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Strip every character outside `[A-Za-z0-9_]`.
///
/// Identifiers cannot be bound as parameters, so this allow-list is the only
/// thing standing between caller text and the SQL. It is not a way to escape
/// values; filter values are always bound.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn checked_identifier(name: &str) -> Result<String, QueryError> {
    let sanitized = sanitize_identifier(name);
    if sanitized.is_empty() {
        return Err(QueryError::InvalidColumn(name.to_string()));
    }
    Ok(sanitized)
}

/// Build the aggregation statement for a set of parameters.
///
/// WHERE clauses and their bound values come out of a single pass over the
/// filters, so placeholder order always matches value order.
pub fn build_aggregation_query(params: &QueryParams) -> Result<AggregationQuery, QueryError> {
    let group_columns = params
        .group_by
        .iter()
        .map(|c| checked_identifier(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut clauses = Vec::with_capacity(params.filters.len());
    let mut values = Vec::with_capacity(params.filters.len());
    for (column, value) in &params.filters {
        clauses.push(format!("{} = ?", checked_identifier(column)?));
        values.push(value.clone());
    }

    let mut sql = format!("SELECT {}", METRICS_PROJECTION);
    for column in &group_columns {
        sql.push_str(&format!(", CAST({} AS TEXT)", column));
    }
    sql.push_str(&format!(" FROM {}", sqlite::TABLE_NAME));

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if !group_columns.is_empty() {
        let columns = group_columns.join(", ");
        sql.push_str(" GROUP BY ");
        sql.push_str(&columns);
        sql.push_str(" ORDER BY ");
        sql.push_str(&columns);
    }

    Ok(AggregationQuery { sql, params: values })
}

/// Runs aggregation queries against a populated store
pub struct QueryEngine {
    config: QueryConfig,
}

impl QueryEngine {
    /// Create a new query engine
    pub fn new(config: QueryConfig) -> Self {
        QueryEngine { config }
    }

    /// Open a store read-only
    pub fn open<P: AsRef<Path>>(&self, db_path: P) -> Result<Connection, QueryError> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(QueryError::StoreNotFound(db_path.display().to_string()));
        }

        Ok(sqlite::open_for_query(db_path, self.config.cache_size_kib)?)
    }

    /// Open the store at `db_path` and run one aggregation
    pub fn query_file<P: AsRef<Path>>(
        &self,
        db_path: P,
        params: &QueryParams,
    ) -> Result<Vec<ResultRow>, QueryError> {
        let conn = self.open(db_path)?;
        self.execute(&conn, params)
    }

    /// Run one aggregation on an open connection.
    ///
    /// Each group becomes one row holding the nine metrics plus the group
    /// columns under the names the caller supplied. No matching rows gives an
    /// empty result.
    pub fn execute(&self, conn: &Connection, params: &QueryParams) -> Result<Vec<ResultRow>, QueryError> {
        let query = build_aggregation_query(params)?;
        debug!("Executing query: {}", query.sql);

        let mut stmt = conn.prepare(&query.sql)?;
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;

        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut metrics = Vec::with_capacity(METRIC_NAMES.len());
            for i in 0..METRIC_NAMES.len() {
                metrics.push(row.get::<_, Option<String>>(i)?.unwrap_or_default());
            }

            // Without GROUP BY an empty match still yields one all-NULL row
            if metrics[ORDER_COUNT_INDEX].is_empty() || metrics[ORDER_COUNT_INDEX] == "0" {
                continue;
            }

            let mut result: ResultRow = METRIC_NAMES
                .iter()
                .map(|name| name.to_string())
                .zip(metrics)
                .collect();

            for (offset, column) in params.group_by.iter().enumerate() {
                let value = row
                    .get::<_, Option<String>>(METRIC_NAMES.len() + offset)?
                    .unwrap_or_default();
                result.insert(column.clone(), value);
            }

            results.push(result);
        }

        info!("Query returned {} groups", results.len());
        Ok(results)
    }
}
