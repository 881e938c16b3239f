use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};

use crate::libs::error::{Error, Result};
use crate::libs::params::{Filters, Params};
use crate::libs::record::Record;
use crate::libs::value::SqlValue;

/// Statement shapes driven by keyword filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// `SELECT ... LIMIT 1`
    Select,
    /// `SELECT ...`, all rows when there are no filters
    SelectBatch,
    /// `DELETE ...`, filters required
    Delete,
}

/// Builds a table's statements with `:name` placeholders.
pub struct QueryBuilder<'a> {
    table: &'a str,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    /// `INSERT OR REPLACE` over every field except an unset `id`.
    pub fn insert_or_replace(&self, record: &Record) -> (String, Params) {
        let params: Params = record
            .to_map()
            .into_iter()
            .filter(|(name, value)| !(name == "id" && value.is_null()))
            .collect();
        let cols: Vec<&str> = params.names().collect();
        let placeholders: Vec<String> = cols.iter().map(|c| format!(":{}", c)).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.table,
            cols.join(", "),
            placeholders.join(", ")
        );
        (sql, params)
    }

    /// `a = :a AND b = :b` in filter order.
    pub fn conditions(&self, filters: &Filters) -> String {
        filters
            .names()
            .map(|name| format!("{} = :{}", name, name))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn build(&self, mode: QueryMode, filters: &Filters) -> Result<String> {
        let conditions = self.conditions(filters);
        let sql = match mode {
            QueryMode::Select if filters.is_empty() => format!("SELECT * FROM {} LIMIT 1", self.table),
            QueryMode::Select => format!("SELECT * FROM {} WHERE {} LIMIT 1", self.table, conditions),
            QueryMode::SelectBatch if filters.is_empty() => {
                format!("SELECT * FROM {} WHERE 1=1", self.table)
            }
            QueryMode::SelectBatch => format!("SELECT * FROM {} WHERE {}", self.table, conditions),
            QueryMode::Delete if filters.is_empty() => {
                return Err(Error::UnconditionalDelete {
                    table: self.table.to_string(),
                });
            }
            QueryMode::Delete => format!("DELETE FROM {} WHERE {}", self.table, conditions),
        };
        Ok(sql)
    }
}

/// Attach positional values to a prepared query.
pub(crate) fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<SqlValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Real(v) => query.bind(v),
            SqlValue::Boolean(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Blob(v) => query.bind(v),
        };
    }
    query
}

/// Decode a row by the storage class SQLite reports for each value.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|index| decode_column(row, index)).collect()
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    let value = match storage.as_str() {
        "INTEGER" => SqlValue::Integer(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => SqlValue::Real(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// Result column names in select order.
pub(crate) fn column_names(row: &SqliteRow) -> Vec<String> {
    use sqlx::Column;
    row.columns().iter().map(|c| c.name().to_string()).collect()
}
