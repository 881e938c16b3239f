use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteQueryResult, SqliteRow};
use sqlx::{Executor, Sqlite, Transaction};

use crate::libs::error::{Error, Result};
use crate::libs::outcome::Outcome;
use crate::libs::params::{BoundQuery, Filters, Params, bind_named};
use crate::libs::query_builder::{QueryBuilder, QueryMode, bind_values, column_names, decode_row};
use crate::libs::record::{Record, RecordType};
use crate::libs::value::SqlValue;

/// CRUD surface every generated repository exposes.
///
/// Execution failures never surface as `Err`: they are logged and reported as
/// [`Outcome::Failed`]. Only an illegal statement (an unfiltered delete) is
/// rejected with an error, before anything reaches the database.
#[async_trait]
pub trait Repo: Send + Sync {
    /// Insert or replace one record. An unset `id` is back-filled with the new row id.
    async fn save_single(&self, record: &mut Record) -> Outcome<i64>;

    /// Save every record inside one transaction; all or nothing. An empty batch fails.
    async fn save_many(&self, records: &mut [Record]) -> Outcome<usize>;

    /// First row matching all filters.
    async fn load_single(&self, filters: &Filters) -> Outcome<Record>;

    /// Every row matching all filters; every row when there are none.
    async fn load_many(&self, filters: &Filters) -> Outcome<Vec<Record>>;

    /// Delete matching rows. Refuses to run without filters.
    async fn delete(&self, filters: &Filters) -> Result<Outcome<u64>>;

    /// Run caller-supplied SQL; rows come back as ad-hoc records.
    async fn custom_query(&self, query: &str, params: &Params) -> Outcome<Vec<Record>>;
}

/// A typed handle to one table.
#[derive(Debug)]
pub struct Repository {
    table: String,
    columns: Vec<String>,
    record_type: Arc<RecordType>,
    pool: SqlitePool,
}

impl Repository {
    pub(crate) fn new(table: String, columns: Vec<String>, record_type: Arc<RecordType>, pool: SqlitePool) -> Self {
        Self {
            table,
            columns,
            record_type,
            pool,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Data columns in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    /// A blank record of this table's type.
    pub fn new_record(&self) -> Record {
        self.record_type.instance()
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.table)
    }

    fn failed<T>(&self, operation: &'static str, error: Error) -> Outcome<T> {
        tracing::error!(
            table = %self.table,
            operation,
            code = error.code(),
            error = %error,
            "repository operation failed"
        );
        Outcome::Failed(error)
    }

    async fn rollback(&self, tx: Transaction<'static, Sqlite>) {
        if let Err(e) = tx.rollback().await {
            tracing::error!(table = %self.table, error = %e, "rollback failed");
        }
    }

    fn rows_to_records(&self, rows: &[SqliteRow]) -> Result<Vec<Record>> {
        rows.iter()
            .map(|row| decode_row(row).map(|values| self.record_type.from_row(values)))
            .collect()
    }
}

fn backfill_id(record: &mut Record, row_id: i64) {
    if record.get("id").is_some_and(SqlValue::is_null) {
        if let Err(e) = record.set("id", row_id) {
            tracing::warn!(error = %e, "could not back-fill id");
        }
    }
}

async fn execute<'e, E>(executor: E, sql: &str, params: &Params) -> Result<SqliteQueryResult>
where
    E: Executor<'e, Database = Sqlite>,
{
    let BoundQuery { sql, values } = bind_named(sql, params)?;
    tracing::debug!(%sql, "executing statement");
    Ok(bind_values(sqlx::query(&sql), values).execute(executor).await?)
}

async fn fetch_optional<'e, E>(executor: E, sql: &str, params: &Params) -> Result<Option<SqliteRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let BoundQuery { sql, values } = bind_named(sql, params)?;
    tracing::debug!(%sql, "fetching one row");
    Ok(bind_values(sqlx::query(&sql), values).fetch_optional(executor).await?)
}

async fn fetch_all<'e, E>(executor: E, sql: &str, params: &Params) -> Result<Vec<SqliteRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let BoundQuery { sql, values } = bind_named(sql, params)?;
    tracing::debug!(%sql, "fetching rows");
    Ok(bind_values(sqlx::query(&sql), values).fetch_all(executor).await?)
}

#[async_trait]
impl Repo for Repository {
    async fn save_single(&self, record: &mut Record) -> Outcome<i64> {
        let (sql, params) = self.builder().insert_or_replace(record);
        match execute(&self.pool, &sql, &params).await {
            Ok(result) => {
                let row_id = result.last_insert_rowid();
                backfill_id(record, row_id);
                tracing::info!(table = %self.table, row_id, "saved single record");
                if row_id > 0 { Outcome::Done(row_id) } else { Outcome::Empty }
            }
            Err(e) => self.failed("save_single", e),
        }
    }

    async fn save_many(&self, records: &mut [Record]) -> Outcome<usize> {
        if records.is_empty() {
            return self.failed(
                "save_many",
                Error::EmptyBatch {
                    table: self.table.clone(),
                },
            );
        }
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return self.failed("save_many", e.into()),
        };
        let mut row_ids = Vec::with_capacity(records.len());
        for record in records.iter() {
            let (sql, params) = self.builder().insert_or_replace(record);
            match execute(&mut *tx, &sql, &params).await {
                Ok(result) => row_ids.push(result.last_insert_rowid()),
                Err(e) => {
                    self.rollback(tx).await;
                    return self.failed("save_many", e);
                }
            }
        }
        if let Err(e) = tx.commit().await {
            return self.failed("save_many", e.into());
        }
        // ids are only handed out once the batch is durable
        for (record, row_id) in records.iter_mut().zip(row_ids) {
            backfill_id(record, row_id);
        }
        tracing::info!(table = %self.table, count = records.len(), "saved many records");
        Outcome::Done(records.len())
    }

    async fn load_single(&self, filters: &Filters) -> Outcome<Record> {
        let sql = match self.builder().build(QueryMode::Select, filters) {
            Ok(sql) => sql,
            Err(e) => return self.failed("load_single", e),
        };
        tracing::info!(table = %self.table, filters = ?filters, "loading single record");
        match fetch_optional(&self.pool, &sql, filters).await {
            Ok(Some(row)) => match decode_row(&row) {
                Ok(values) => Outcome::Done(self.record_type.from_row(values)),
                Err(e) => self.failed("load_single", e),
            },
            Ok(None) => {
                tracing::info!(table = %self.table, "no record found");
                Outcome::Empty
            }
            Err(e) => self.failed("load_single", e),
        }
    }

    async fn load_many(&self, filters: &Filters) -> Outcome<Vec<Record>> {
        let sql = match self.builder().build(QueryMode::SelectBatch, filters) {
            Ok(sql) => sql,
            Err(e) => return self.failed("load_many", e),
        };
        match fetch_all(&self.pool, &sql, filters).await {
            Ok(rows) if rows.is_empty() => {
                tracing::info!(table = %self.table, "no records found");
                Outcome::Empty
            }
            Ok(rows) => match self.rows_to_records(&rows) {
                Ok(records) => {
                    tracing::info!(table = %self.table, count = records.len(), "records found");
                    Outcome::Done(records)
                }
                Err(e) => self.failed("load_many", e),
            },
            Err(e) => self.failed("load_many", e),
        }
    }

    async fn delete(&self, filters: &Filters) -> Result<Outcome<u64>> {
        let sql = self.builder().build(QueryMode::Delete, filters)?;
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return Ok(self.failed("delete", e.into())),
        };
        let affected = match execute(&mut *tx, &sql, filters).await {
            Ok(result) => result.rows_affected(),
            Err(e) => {
                self.rollback(tx).await;
                return Ok(self.failed("delete", e));
            }
        };
        if let Err(e) = tx.commit().await {
            return Ok(self.failed("delete", e.into()));
        }
        if affected > 0 {
            tracing::info!(table = %self.table, affected, "deleted records");
            Ok(Outcome::Done(affected))
        } else {
            tracing::info!(table = %self.table, "no records deleted");
            Ok(Outcome::Empty)
        }
    }

    async fn custom_query(&self, query: &str, params: &Params) -> Outcome<Vec<Record>> {
        let rows = match fetch_all(&self.pool, query, params).await {
            Ok(rows) => rows,
            Err(e) => return self.failed("custom_query", e),
        };
        let Some(first) = rows.first() else {
            tracing::info!(table = %self.table, "custom query returned no rows");
            return Outcome::Empty;
        };
        let custom = RecordType::ad_hoc(column_names(first));
        let records: Result<Vec<Record>> = rows
            .iter()
            .map(|row| decode_row(row).map(|values| custom.from_row(values)))
            .collect();
        match records {
            Ok(records) => {
                tracing::info!(table = %self.table, count = records.len(), "custom query executed");
                Outcome::Done(records)
            }
            Err(e) => self.failed("custom_query", e),
        }
    }
}
