use indexmap::IndexMap;

use crate::libs::schema::Schema;

/// Output of [`SqlGenerator::generate`].
#[derive(Debug, Clone, Default)]
pub struct GeneratedSql {
    /// `CREATE TABLE` and `CREATE INDEX` statements separated by blank lines.
    pub script: String,
    /// Data columns of each table in declaration order.
    pub table_fields: IndexMap<String, Vec<String>>,
}

pub struct SqlGenerator;

impl SqlGenerator {
    /// Render table-creation SQL for `schema`. Every data column named in
    /// `indexes` gets an `idx_<table>_<column>` index in whichever table it occurs.
    pub fn generate(schema: &Schema, indexes: &[String]) -> GeneratedSql {
        let mut statements = Vec::new();
        let mut table_fields = IndexMap::new();

        for (table_name, table) in schema.tables() {
            let mut column_defs = Vec::new();
            let mut constraints = Vec::new();
            let mut index_statements = Vec::new();
            let mut fields = Vec::new();

            for (name, definition) in table.data_columns() {
                column_defs.push(format!("{} {}", name, definition));
                fields.push(name.to_string());
                if indexes.iter().any(|idx| idx == name) {
                    index_statements.push(format!(
                        "CREATE INDEX IF NOT EXISTS idx_{table}_{col} ON {table} ({col});",
                        table = table_name,
                        col = name
                    ));
                }
            }
            for (name, definition) in table.constraints() {
                constraints.push(format!("{} {}", name, definition));
            }

            column_defs.extend(constraints);
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
                table_name,
                column_defs.join(",\n    ")
            ));
            statements.extend(index_statements);
            table_fields.insert(table_name.to_string(), fields);
        }

        GeneratedSql {
            script: statements.join("\n\n"),
            table_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::ddl::DdlParser;
    use crate::libs::schema::TableDefinition;

    fn orders_schema() -> Schema {
        let users: TableDefinition = [
            ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            ("name", "TEXT NOT NULL"),
            ("email", "TEXT UNIQUE"),
        ]
        .into_iter()
        .collect();
        let orders: TableDefinition = [
            ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            ("FOREIGN KEY(user_id)", "REFERENCES users(id) ON DELETE CASCADE"),
            ("user_id", "INTEGER"),
            ("total", "DECIMAL(10, 2) NOT NULL"),
            ("status", "TEXT CHECK(status IN ('pending', 'done'))"),
        ]
        .into_iter()
        .collect();
        [("users", users), ("orders", orders)].into_iter().collect()
    }

    #[test]
    fn columns_precede_constraints() {
        let generated = SqlGenerator::generate(&orders_schema(), &[]);
        let expected_orders = "CREATE TABLE IF NOT EXISTS orders (\n    \
            id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
            user_id INTEGER,\n    \
            total DECIMAL(10, 2) NOT NULL,\n    \
            status TEXT CHECK(status IN ('pending', 'done')),\n    \
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE\n);";
        assert!(generated.script.ends_with(expected_orders), "{}", generated.script);
        assert!(generated.script.starts_with("CREATE TABLE IF NOT EXISTS users (\n"));
    }

    #[test]
    fn table_fields_exclude_constraints() {
        let generated = SqlGenerator::generate(&orders_schema(), &[]);
        assert_eq!(generated.table_fields["users"], vec!["id", "name", "email"]);
        assert_eq!(generated.table_fields["orders"], vec!["id", "user_id", "total", "status"]);
    }

    #[test]
    fn index_hints_apply_to_every_matching_table() {
        let generated =
            SqlGenerator::generate(&orders_schema(), &["email".to_string(), "id".to_string(), "nowhere".to_string()]);
        let statements: Vec<&str> = generated.script.split("\n\n").collect();
        assert_eq!(
            statements,
            vec![
                statements[0],
                "CREATE INDEX IF NOT EXISTS idx_users_id ON users (id);",
                "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email);",
                statements[3],
                "CREATE INDEX IF NOT EXISTS idx_orders_id ON orders (id);",
            ]
        );
        assert!(!generated.script.contains("nowhere"));
    }

    #[test]
    fn rendered_sql_parses_back_to_same_columns() {
        let schema = orders_schema();
        let generated = SqlGenerator::generate(&schema, &["email".to_string()]);
        let reparsed = DdlParser::parse(&generated.script).unwrap();
        assert_eq!(reparsed.len(), schema.len());
        for (name, table) in schema.tables() {
            let back = reparsed.table(name).unwrap();
            assert_eq!(back.data_column_names(), table.data_column_names());
            for (column, definition) in table.data_columns() {
                assert_eq!(back.get(column), Some(definition));
            }
        }
    }

    #[test]
    fn empty_schema_renders_nothing() {
        let generated = SqlGenerator::generate(&Schema::new(), &[]);
        assert!(generated.script.is_empty());
        assert!(generated.table_fields.is_empty());
    }
}
