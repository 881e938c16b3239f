use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::libs::validator::base_type;

/// A single field value as stored in or read from the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "float",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Text(_) => "string",
            SqlValue::Blob(_) => "bytes",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Real(v) => Some(*v),
            SqlValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Boolean(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Boolean(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Host-side type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Bytes,
    Boolean,
    /// Untyped field of an ad-hoc record.
    Dynamic,
}

impl FieldKind {
    /// Map a column definition's base SQL type. Unrecognized types are text.
    pub fn from_sql_type(definition: &str) -> Self {
        match base_type(definition).as_str() {
            "INTEGER" => FieldKind::Integer,
            "TEXT" | "TIMESTAMP" => FieldKind::Text,
            "REAL" | "DECIMAL" => FieldKind::Float,
            "BLOB" => FieldKind::Bytes,
            "BOOLEAN" => FieldKind::Boolean,
            _ => FieldKind::Text,
        }
    }

    /// `id` is always the optional integer surrogate key.
    pub fn for_column(name: &str, definition: &str) -> Self {
        if name == "id" {
            FieldKind::Integer
        } else {
            Self::from_sql_type(definition)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Boolean => "boolean",
            FieldKind::Dynamic => "any",
        }
    }

    /// Lossless conversions between SQLite storage classes and this kind.
    pub fn coerce(&self, value: SqlValue) -> SqlValue {
        match (self, value) {
            (FieldKind::Float, SqlValue::Integer(v)) => SqlValue::Real(v as f64),
            (FieldKind::Boolean, SqlValue::Integer(v)) => SqlValue::Boolean(v != 0),
            (FieldKind::Integer, SqlValue::Boolean(v)) => SqlValue::Integer(v.into()),
            (_, value) => value,
        }
    }

    pub fn accepts(&self, value: &SqlValue) -> bool {
        matches!(
            (self, value),
            (_, SqlValue::Null)
                | (FieldKind::Dynamic, _)
                | (FieldKind::Integer, SqlValue::Integer(_))
                | (FieldKind::Float, SqlValue::Real(_))
                | (FieldKind::Text, SqlValue::Text(_))
                | (FieldKind::Bytes, SqlValue::Blob(_))
                | (FieldKind::Boolean, SqlValue::Boolean(_))
        )
    }
}
