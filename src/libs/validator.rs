use std::collections::HashSet;

use crate::libs::error::{Error, Result};
use crate::libs::schema::{Schema, is_constraint};

/// Base SQL types accepted when no custom vocabulary is given.
pub const DEFAULT_SQL_TYPES: [&str; 7] = [
    "INTEGER",
    "TEXT",
    "REAL",
    "BLOB",
    "BOOLEAN",
    "DECIMAL",
    "TIMESTAMP",
];

/// Definitions opening with one of these are constraints written in column position.
const CONSTRAINT_KEYWORDS: [&str; 4] = ["PRIMARY", "FOREIGN", "CHECK", "UNIQUE"];

/// Checks every data column's declared type against a vocabulary of base SQL types.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    types: HashSet<String>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self {
            types: DEFAULT_SQL_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl SchemaValidator {
    /// Validate against a custom vocabulary. An empty vocabulary falls back to the defaults.
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types: HashSet<String> = types
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_uppercase())
            .collect();
        if types.is_empty() {
            Self::default()
        } else {
            Self { types }
        }
    }

    /// Fails on the first column whose base type is not in the vocabulary.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for (table, definition) in schema.tables() {
            for (column, column_type) in definition.members() {
                if is_constraint(column) {
                    continue;
                }
                let head = column_type
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                if CONSTRAINT_KEYWORDS.contains(&head.as_str()) {
                    continue;
                }
                let base = base_type(&head);
                if !self.types.contains(&base) {
                    return Err(Error::InvalidColumnType {
                        table: table.to_string(),
                        column: column.to_string(),
                        type_name: base,
                    });
                }
            }
        }
        tracing::debug!(tables = schema.len(), "schema validated");
        Ok(())
    }
}

/// First token of a column definition, uppercased, without a `(precision)` suffix.
pub fn base_type(definition: &str) -> String {
    let head = definition.split_whitespace().next().unwrap_or_default();
    head.split('(').next().unwrap_or_default().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::schema::TableDefinition;

    fn schema_with(column_type: &str) -> Schema {
        let table: TableDefinition = [
            ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            ("price", column_type),
            ("FOREIGN KEY(id)", "REFERENCES other(id)"),
        ]
        .into_iter()
        .collect();
        [("items", table)].into_iter().collect()
    }

    #[test]
    fn unknown_type_is_rejected_with_location() {
        let err = SchemaValidator::default()
            .validate(&schema_with("FOO"))
            .unwrap_err();
        match err {
            Error::InvalidColumnType {
                table,
                column,
                type_name,
            } => {
                assert_eq!(table, "items");
                assert_eq!(column, "price");
                assert_eq!(type_name, "FOO");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn precision_suffix_is_ignored() {
        assert!(SchemaValidator::default().validate(&schema_with("DECIMAL(10,2)")).is_ok());
        assert!(SchemaValidator::default().validate(&schema_with("decimal(10, 2) NOT NULL")).is_ok());
    }

    #[test]
    fn constraint_definitions_in_column_position_are_skipped() {
        assert!(SchemaValidator::default().validate(&schema_with("UNIQUE")).is_ok());
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let validator = SchemaValidator::with_types(["integer", "money"]);
        assert!(validator.validate(&schema_with("MONEY")).is_ok());
        assert!(validator.validate(&schema_with("TEXT")).is_err());
    }

    #[test]
    fn empty_vocabulary_uses_defaults() {
        let validator = SchemaValidator::with_types(Vec::<String>::new());
        assert!(validator.validate(&schema_with("TIMESTAMP")).is_ok());
    }

    #[test]
    fn base_type_strips_suffix_and_case() {
        assert_eq!(base_type("decimal(10,2) NOT NULL"), "DECIMAL");
        assert_eq!(base_type("TEXT"), "TEXT");
        assert_eq!(base_type(""), "");
    }
}
