// schema.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::libs::ddl::DdlParser;
use crate::libs::error::{Error, Result};

/// Member-name prefixes that mark a table-level constraint instead of a data column.
pub const CONSTRAINT_PREFIXES: [&str; 4] = ["PRIMARY KEY", "UNIQUE", "CHECK", "FOREIGN KEY"];

/// Whether a member name denotes a table constraint. Case-insensitive; the
/// keyword must stand alone, so `checksum` or `unique_code` are columns.
pub fn is_constraint(member: &str) -> bool {
    CONSTRAINT_PREFIXES
        .iter()
        .any(|prefix| starts_with_keyword(member, prefix))
}

/// `keyword` at the start of `text`, followed by the end, whitespace or `(`.
pub(crate) fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    let Some(head) = text.get(..keyword.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(keyword)
        && text[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|next| next.is_whitespace() || next == '(')
}

/// Ordered members of one table: data columns and table constraints,
/// each mapped to its definition string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableDefinition {
    members: IndexMap<String, String>,
}

impl TableDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member. A name already present keeps its position and has
    /// its definition overwritten; the previous definition is returned.
    pub fn insert(&mut self, name: impl Into<String>, definition: impl Into<String>) -> Option<String> {
        self.members.insert(name.into(), definition.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.members.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn data_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members().filter(|(name, _)| !is_constraint(name))
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members().filter(|(name, _)| is_constraint(name))
    }

    pub fn data_column_names(&self) -> Vec<String> {
        self.data_columns().map(|(name, _)| name.to_string()).collect()
    }

    pub fn has_foreign_keys(&self) -> bool {
        self.members
            .keys()
            .any(|name| name.to_ascii_uppercase().contains("FOREIGN KEY"))
    }
}

impl<K, V> FromIterator<(K, V)> for TableDefinition
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = TableDefinition::new();
        for (name, definition) in iter {
            table.insert(name, definition);
        }
        table
    }
}

/// Ordered mapping of table name to its definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: IndexMap<String, TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any earlier table of the same name.
    pub fn insert_table(&mut self, name: impl Into<String>, table: TableDefinition) -> Option<TableDefinition> {
        self.tables.insert(name.into(), table)
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDefinition)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// True when any table declares a `FOREIGN KEY` member.
    pub fn has_foreign_keys(&self) -> bool {
        self.tables.values().any(TableDefinition::has_foreign_keys)
    }
}

impl<K> FromIterator<(K, TableDefinition)> for Schema
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, TableDefinition)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, table) in iter {
            schema.insert_table(name, table);
        }
        schema
    }
}

/// A schema as handed in by the caller: raw DDL text or an already structured mapping.
#[derive(Debug, Clone)]
pub enum SchemaInput {
    Ddl(String),
    Structured(Schema),
}

impl SchemaInput {
    /// Interpret a JSON value: a string is DDL text, an object is a table mapping.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::String(ddl) => Ok(SchemaInput::Ddl(ddl)),
            Value::Object(_) => Ok(SchemaInput::Structured(serde_json::from_value(value)?)),
            other => Err(Error::UnsupportedSchemaInput {
                found: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn into_schema(self) -> Result<Schema> {
        match self {
            SchemaInput::Ddl(text) => {
                tracing::info!("schema identified as DDL text");
                DdlParser::parse(&text)
            }
            SchemaInput::Structured(schema) => {
                tracing::info!(tables = schema.len(), "schema identified as table mapping");
                Ok(schema)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<&str> for SchemaInput {
    fn from(ddl: &str) -> Self {
        SchemaInput::Ddl(ddl.to_string())
    }
}

impl From<String> for SchemaInput {
    fn from(ddl: String) -> Self {
        SchemaInput::Ddl(ddl)
    }
}

impl From<Schema> for SchemaInput {
    fn from(schema: Schema) -> Self {
        SchemaInput::Structured(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constraint_prefixes_are_case_insensitive() {
        assert!(is_constraint("PRIMARY KEY"));
        assert!(is_constraint("FOREIGN KEY(user_id)"));
        assert!(is_constraint("foreign key(user_id)"));
        assert!(is_constraint("CHECK"));
        assert!(is_constraint("UNIQUE(email)"));
        assert!(!is_constraint("unique_code"));
        assert!(!is_constraint("check_date"));
        assert!(!is_constraint("id"));
    }

    #[test]
    fn column_names_sharing_a_keyword_prefix_are_data_columns() {
        for name in ["checksum", "checked_at", "unique_code", "UNIQUENESS", "primary_key_hint"] {
            assert!(!is_constraint(name), "{} should be a column", name);
        }
        assert!(is_constraint("check (a > 0)"));
        assert!(is_constraint("unique\t(email)"));
    }

    #[test]
    fn later_member_overwrites_earlier_in_place() {
        let mut table = TableDefinition::new();
        table.insert("a", "INTEGER");
        table.insert("b", "TEXT");
        let previous = table.insert("a", "REAL");
        assert_eq!(previous.as_deref(), Some("INTEGER"));
        let names: Vec<_> = table.members().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.get("a"), Some("REAL"));
    }

    #[test]
    fn data_columns_exclude_constraints() {
        let table: TableDefinition = [
            ("order_id", "INTEGER"),
            ("product_id", "INTEGER"),
            ("PRIMARY KEY", "(order_id, product_id)"),
            ("FOREIGN KEY(order_id)", "REFERENCES orders(id)"),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.data_column_names(), vec!["order_id", "product_id"]);
        assert_eq!(table.constraints().count(), 2);
        assert!(table.has_foreign_keys());
    }

    #[test]
    fn json_object_is_structured_and_keeps_order() {
        let value = json!({
            "users": {"id": "INTEGER PRIMARY KEY", "name": "TEXT", "email": "TEXT"},
            "posts": {"id": "INTEGER PRIMARY KEY", "title": "TEXT"}
        });
        let schema = SchemaInput::from_json(value).unwrap().into_schema().unwrap();
        assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["users", "posts"]);
        assert_eq!(
            schema.table("users").unwrap().data_column_names(),
            vec!["id", "name", "email"]
        );
    }

    #[test]
    fn json_string_is_ddl() {
        let value = json!("CREATE TABLE t (id INTEGER, name TEXT);");
        let schema = SchemaInput::from_json(value).unwrap().into_schema().unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.table("t").unwrap().len(), 2);
    }

    #[test]
    fn other_json_kinds_are_rejected() {
        let err = SchemaInput::from_json(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchemaInput { ref found } if found == "array"));
        assert!(err.is_schema_error());
    }

    #[test]
    fn empty_schema_is_legal() {
        let schema = Schema::new();
        assert!(schema.is_empty());
        assert!(!schema.has_foreign_keys());
    }
}
