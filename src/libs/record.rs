//! Runtime record types.
//!
//! Table shapes are only known once a schema has been read, so a record is a
//! generic ordered container whose layout is described by a shared
//! [`RecordType`]. One record type is built per table from its data columns;
//! custom queries get an ad-hoc, untyped record type from their result columns.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::libs::error::{Error, Result};
use crate::libs::value::{FieldKind, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
    positions: HashMap<String, usize>,
}

impl RecordType {
    fn build(name: String, fields: Vec<FieldDescriptor>) -> Arc<Self> {
        let mut positions = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            positions.entry(field.name.clone()).or_insert(i);
        }
        Arc::new(Self {
            name,
            fields,
            positions,
        })
    }

    /// Record type for a table from its `(column, definition)` pairs in declaration order.
    pub fn for_table<I, N, D>(table_name: &str, columns: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (N, D)>,
        N: AsRef<str>,
        D: AsRef<str>,
    {
        let fields = columns
            .into_iter()
            .map(|(name, definition)| FieldDescriptor {
                kind: FieldKind::for_column(name.as_ref(), definition.as_ref()),
                name: name.as_ref().to_string(),
            })
            .collect();
        Self::build(format!("{}Record", capitalize(table_name)), fields)
    }

    /// Untyped record type for a result set known only at query time.
    pub fn ad_hoc<I, S>(column_names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = column_names
            .into_iter()
            .map(|name| FieldDescriptor {
                name: name.as_ref().to_string(),
                kind: FieldKind::Dynamic,
            })
            .collect();
        Self::build("CustomResult".to_string(), fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.positions.get(field).copied()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.positions.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A record with every field unset.
    pub fn instance(self: &Arc<Self>) -> Record {
        Record {
            record_type: Arc::clone(self),
            values: vec![SqlValue::Null; self.fields.len()],
        }
    }

    /// Zip positional row values against the declared field order.
    /// Surplus values are dropped, missing ones stay unset.
    pub fn from_row(self: &Arc<Self>, row: Vec<SqlValue>) -> Record {
        let mut record = self.instance();
        for ((slot, field), value) in record.values.iter_mut().zip(&self.fields).zip(row) {
            *slot = field.kind.coerce(value);
        }
        record
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

/// One row of a table or of a custom query.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    record_type: Arc<RecordType>,
    values: Vec<SqlValue>,
}

impl Record {
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.record_type.position(field).map(|i| &self.values[i])
    }

    /// Set a field, converting storage-compatible values to the field's kind.
    pub fn set(&mut self, field: &str, value: impl Into<SqlValue>) -> Result<()> {
        let position = self
            .record_type
            .position(field)
            .ok_or_else(|| Error::UnknownField {
                record: self.record_type.name.clone(),
                field: field.to_string(),
            })?;
        let kind = self.record_type.fields[position].kind;
        let value = kind.coerce(value.into());
        if !kind.accepts(&value) {
            return Err(Error::TypeMismatch {
                field: field.to_string(),
                expected: kind.name(),
                found: value.kind_name(),
            });
        }
        self.values[position] = value;
        Ok(())
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// The surrogate key, when the record has an `id` field holding an integer.
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(SqlValue::as_i64)
    }

    pub fn to_map(&self) -> IndexMap<String, SqlValue> {
        self.record_type
            .field_names()
            .map(str::to_string)
            .zip(self.values.iter().cloned())
            .collect()
    }

    pub fn to_tuple(&self) -> Vec<SqlValue> {
        self.values.clone()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .record_type
            .field_names()
            .zip(&self.values)
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .record_type
            .field_names()
            .zip(&self.values)
            .map(|(name, value)| {
                if value.is_null() {
                    format!("{}: N/A", humanize(name))
                } else {
                    format!("{}: {}", humanize(name), value)
                }
            })
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `created_at` -> `Created At`.
fn humanize(name: &str) -> String {
    name.replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
