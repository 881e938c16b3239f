use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::libs::error::{Error, Result};

/// Where the store lives and how the session behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Folder holding the database file; created on connect when missing.
    pub folder_name: PathBuf,

    /// Database file name inside `folder_name`.
    pub db_name: String,

    /// Private in-memory store instead of a file.
    pub in_memory: bool,

    /// Columns that get a `CREATE INDEX` wherever they occur.
    pub indexes: Vec<String>,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            folder_name: PathBuf::from("hive"),
            db_name: "hive_1.db".to_string(),
            in_memory: false,
            indexes: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl OrmConfig {
    /// Load from `REPOKIT_*` environment variables, defaulting what is unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            folder_name: env::var("REPOKIT_DB_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.folder_name),

            db_name: env::var("REPOKIT_DB_NAME").unwrap_or(defaults.db_name),

            in_memory: match env::var("REPOKIT_IN_MEMORY") {
                Ok(v) => v.parse().map_err(|_| Error::Configuration {
                    message: format!("REPOKIT_IN_MEMORY must be true or false, got '{}'", v),
                })?,
                Err(_) => defaults.in_memory,
            },

            indexes: env::var("REPOKIT_INDEXES")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.indexes),

            log_level: env::var("REPOKIT_LOG").unwrap_or(defaults.log_level),
        })
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder_name = folder.into();
        self
    }

    pub fn with_db_name(mut self, name: impl Into<String>) -> Self {
        self.db_name = name.into();
        self
    }

    pub fn with_indexes<I, S>(mut self, indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes = indexes.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.folder_name.join(&self.db_name)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_hive_folder() {
        let config = OrmConfig::default();
        assert_eq!(config.db_path(), PathBuf::from("hive").join("hive_1.db"));
        assert!(!config.in_memory);
        assert!(config.indexes.is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: OrmConfig =
            serde_json::from_str(r#"{"db_name": "shop.db", "indexes": ["email"]}"#).unwrap();
        assert_eq!(config.db_name, "shop.db");
        assert_eq!(config.folder_name, PathBuf::from("hive"));
        assert_eq!(config.indexes, vec!["email"]);
    }

    #[test]
    fn builders_chain() {
        let config = OrmConfig::default()
            .with_folder("/tmp/data")
            .with_db_name("x.db")
            .with_indexes(["a", "b"])
            .in_memory();
        assert_eq!(config.db_path(), PathBuf::from("/tmp/data/x.db"));
        assert!(config.in_memory);
        assert_eq!(config.indexes.len(), 2);
    }

    #[test]
    fn index_list_ignores_blanks() {
        assert_eq!(parse_list(" a, ,b ,"), vec!["a", "b"]);
    }
}
