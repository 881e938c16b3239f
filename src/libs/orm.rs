use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::libs::config::OrmConfig;
use crate::libs::error::{Error, Result};
use crate::libs::record::RecordType;
use crate::libs::repository::Repository;
use crate::libs::schema::{Schema, SchemaInput};
use crate::libs::sql_gen::{GeneratedSql, SqlGenerator};
use crate::libs::validator::SchemaValidator;

/// How long a caller waits for the shared connection. Callers queue behind
/// whoever holds it instead of failing after sqlx's 30s default.
const CONNECTION_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// One database session: the schema, its single shared connection and the
/// repositories created from it.
pub struct Orm {
    config: OrmConfig,
    schema: Schema,
    generated: GeneratedSql,
    pool: Option<SqlitePool>,
    repositories: Mutex<IndexMap<String, Arc<Repository>>>,
}

impl Orm {
    /// Parse and validate the schema with the default type vocabulary.
    /// Nothing touches the database yet.
    pub fn new(config: OrmConfig, schema: impl Into<SchemaInput>) -> Result<Self> {
        Self::with_validator(config, schema, &SchemaValidator::default())
    }

    pub fn with_validator(
        config: OrmConfig,
        schema: impl Into<SchemaInput>,
        validator: &SchemaValidator,
    ) -> Result<Self> {
        let schema = schema.into().into_schema()?;
        validator.validate(&schema)?;
        let generated = SqlGenerator::generate(&schema, &config.indexes);
        Ok(Self {
            config,
            schema,
            generated,
            pool: None,
            repositories: Mutex::new(IndexMap::new()),
        })
    }

    /// Connect, create the tables and build every repository.
    ///
    /// ```no_run
    /// # async fn run() -> repokit::Result<()> {
    /// use repokit::{Orm, OrmConfig};
    ///
    /// let orm = Orm::init(
    ///     OrmConfig::default(),
    ///     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
    /// )
    /// .await?;
    /// let users = orm.repository("users")?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn init(config: OrmConfig, schema: impl Into<SchemaInput>) -> Result<Self> {
        tracing::info!("initializing database");
        let mut orm = Self::new(config, schema)?;
        orm.connect().await?;
        orm.migrate().await?;
        let repositories = orm.repositories()?;
        tracing::info!(count = repositories.len(), "repositories created");
        Ok(orm)
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The `CREATE TABLE`/`CREATE INDEX` script run by [`Orm::migrate`].
    pub fn sql_script(&self) -> &str {
        &self.generated.script
    }

    /// Database file, `None` for an in-memory store.
    pub fn db_path(&self) -> Option<PathBuf> {
        (!self.config.in_memory).then(|| self.config.db_path())
    }

    fn create_db_folder(&self) -> Result<()> {
        let folder = &self.config.folder_name;
        if folder.as_os_str().is_empty() || folder.exists() {
            tracing::info!(folder = %folder.display(), "using existing database folder");
            return Ok(());
        }
        std::fs::create_dir_all(folder)?;
        tracing::info!(folder = %folder.display(), "created database folder");
        Ok(())
    }

    /// Open the shared connection. Calling it again keeps the existing one.
    pub async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let options = match self.db_path() {
            Some(path) => {
                self.create_db_folder()?;
                SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true)
            }
            None => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };
        let foreign_keys = self.schema.has_foreign_keys();
        let options = options.foreign_keys(foreign_keys);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(CONNECTION_WAIT)
            .connect_with(options)
            .await?;
        tracing::info!(
            path = ?self.db_path(),
            foreign_keys,
            "database connection established"
        );
        self.pool = Some(pool);
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.pool.as_ref().ok_or(Error::NotConnected)
    }

    /// Create every table and index that does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool()?;
        if self.generated.script.is_empty() {
            tracing::info!("schema has no tables, nothing to create");
            return Ok(());
        }
        tracing::debug!(script = %self.generated.script, "creating tables");
        sqlx::raw_sql(&self.generated.script).execute(pool).await?;
        tracing::info!(tables = self.schema.len(), "database schema initialized");
        Ok(())
    }

    /// The repository of `table`, created on first request and cached for the session.
    pub fn repository(&self, table: &str) -> Result<Arc<Repository>> {
        let mut repositories = self.repositories.lock();
        if let Some(repository) = repositories.get(table) {
            return Ok(Arc::clone(repository));
        }
        let pool = self.pool()?.clone();
        let definition = self.schema.table(table).ok_or_else(|| Error::UnknownTable {
            name: table.to_string(),
        })?;
        let columns = self
            .generated
            .table_fields
            .get(table)
            .cloned()
            .unwrap_or_default();
        let record_type = RecordType::for_table(
            table,
            columns
                .iter()
                .map(|name| (name.as_str(), definition.get(name).unwrap_or_default())),
        );
        let repository = Arc::new(Repository::new(table.to_string(), columns, record_type, pool));
        repositories.insert(table.to_string(), Arc::clone(&repository));
        tracing::debug!(table, "repository created");
        Ok(repository)
    }

    /// Every table's repository, in schema order.
    pub fn repositories(&self) -> Result<IndexMap<String, Arc<Repository>>> {
        self.schema
            .table_names()
            .map(|name| Ok((name.to_string(), self.repository(name)?)))
            .collect()
    }

    /// Forget every cached repository; the next request builds a fresh one.
    pub fn reset(&self) {
        self.repositories.lock().clear();
        tracing::info!("repository registry reset");
    }

    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::debug!("database connection closed");
        }
    }

    /// Close the session; with `full`, also delete the database file and its folder.
    pub async fn clean_up(mut self, full: bool) -> Result<()> {
        self.reset();
        self.close().await;
        if full && let Some(path) = self.db_path() {
            if path.exists() {
                tokio::fs::remove_file(&path).await?;
                tracing::info!(path = %path.display(), "database file removed");
            }
            let folder = &self.config.folder_name;
            if !folder.as_os_str().is_empty() && folder.exists() {
                tokio::fs::remove_dir_all(folder).await?;
                tracing::info!(folder = %folder.display(), "database folder removed");
            }
        }
        Ok(())
    }
}
