//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // -------- Schema errors --------
    #[error("table name not found in statement: {statement}")]
    TableNameNotFound { statement: String },

    #[error("column definitions not found in statement: {statement}")]
    ColumnsNotFound { statement: String },

    #[error("invalid column definition: '{definition}'")]
    InvalidColumnDefinition { definition: String },

    #[error("invalid SQL type '{type_name}' in table '{table}', column '{column}'")]
    InvalidColumnType {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("unsupported schema input: expected DDL text or a table mapping, got {found}")]
    UnsupportedSchemaInput { found: String },

    // -------- Query construction errors --------
    #[error("refusing to delete from '{table}' without filters")]
    UnconditionalDelete { table: String },

    #[error("nothing to save into '{table}': empty batch")]
    EmptyBatch { table: String },

    #[error("no value supplied for named parameter ':{name}'")]
    MissingParameter { name: String },

    // -------- Record errors --------
    #[error("field '{field}' is not defined on {record}")]
    UnknownField { record: String, field: String },

    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    // -------- Session errors --------
    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    #[error("database not connected")]
    NotConnected,

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable code used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::TableNameNotFound { .. } => "TABLE_NAME_NOT_FOUND",
            Error::ColumnsNotFound { .. } => "COLUMNS_NOT_FOUND",
            Error::InvalidColumnDefinition { .. } => "INVALID_COLUMN_DEFINITION",
            Error::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Error::UnsupportedSchemaInput { .. } => "UNSUPPORTED_SCHEMA_INPUT",
            Error::UnconditionalDelete { .. } => "UNCONDITIONAL_DELETE",
            Error::EmptyBatch { .. } => "EMPTY_BATCH",
            Error::MissingParameter { .. } => "MISSING_PARAMETER",
            Error::UnknownField { .. } => "UNKNOWN_FIELD",
            Error::TypeMismatch { .. } => "TYPE_MISMATCH",
            Error::UnknownTable { .. } => "UNKNOWN_TABLE",
            Error::NotConnected => "NOT_CONNECTED",
            Error::Configuration { .. } => "CONFIGURATION_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    /// Errors raised while reading, parsing or validating a schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::TableNameNotFound { .. }
                | Error::ColumnsNotFound { .. }
                | Error::InvalidColumnDefinition { .. }
                | Error::InvalidColumnType { .. }
                | Error::UnsupportedSchemaInput { .. }
        )
    }
}
