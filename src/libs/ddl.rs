//! Recovers a structured [`Schema`] from free-form `CREATE TABLE` text.
//!
//! Only the statement shape is recognized: anything between `CREATE TABLE`
//! and the first following `);` is taken as one statement, other text is
//! ignored. Each statement yields one table whose members are the top-level
//! comma-separated clauses of its body.

use std::sync::LazyLock;

use regex::Regex;

use crate::libs::error::{Error, Result};
use crate::libs::schema::{Schema, TableDefinition, starts_with_keyword};

static STATEMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)CREATE\s+TABLE.*?\);").expect("valid regex"));

static NAME_IF_NOT_EXISTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CREATE\s+TABLE\s+IF\s+NOT\s+EXISTS\s+(\w+)\s*\(").expect("valid regex")
});

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CREATE\s+TABLE\s+(\w+)\s*\(").expect("valid regex"));

pub struct DdlParser;

impl DdlParser {
    /// Parse every `CREATE TABLE` statement in `text`.
    ///
    /// A later statement for an already seen table name replaces it.
    pub fn parse(text: &str) -> Result<Schema> {
        let mut schema = Schema::new();
        for statement in Self::split_statements(text) {
            let name = Self::table_name(statement)?;
            let table = Self::table_definition(statement)?;
            tracing::debug!(table = %name, members = table.len(), "parsed CREATE TABLE statement");
            schema.insert_table(name, table);
        }
        Ok(schema)
    }

    pub(crate) fn split_statements(text: &str) -> Vec<&str> {
        STATEMENT_REGEX.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub(crate) fn table_name(statement: &str) -> Result<String> {
        NAME_IF_NOT_EXISTS_REGEX
            .captures(statement)
            .or_else(|| NAME_REGEX.captures(statement))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::TableNameNotFound {
                statement: statement.trim().to_string(),
            })
    }

    /// Everything between the first `(` and the last `)` of the statement.
    pub(crate) fn body(statement: &str) -> Result<&str> {
        match (statement.find('('), statement.rfind(')')) {
            (Some(open), Some(close)) if open < close => Ok(&statement[open + 1..close]),
            _ => Err(Error::ColumnsNotFound {
                statement: statement.trim().to_string(),
            }),
        }
    }

    fn table_definition(statement: &str) -> Result<TableDefinition> {
        let mut table = TableDefinition::new();
        for member in Self::split_members(Self::body(statement)?) {
            let (name, definition) = Self::parse_member(member)?;
            if let Some(previous) = table.insert(name.clone(), definition) {
                tracing::debug!(member = %name, %previous, "member name collision, keeping the later definition");
            }
        }
        Ok(table)
    }

    /// Split a table body on commas outside of any parentheses.
    pub(crate) fn split_members(body: &str) -> Vec<&str> {
        let mut members = Vec::new();
        let mut depth: i32 = 0;
        let mut start = 0;
        for (i, ch) in body.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                ',' if depth == 0 => {
                    members.push(body[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            }
        }
        members.push(body[start..].trim());
        members.retain(|m| !m.is_empty());
        members
    }

    pub(crate) fn parse_member(member: &str) -> Result<(String, String)> {
        let member = member.trim();
        if starts_with_keyword(member, "FOREIGN KEY") {
            let close = closing_paren(member).ok_or_else(|| Error::InvalidColumnDefinition {
                definition: member.to_string(),
            })?;
            let (name, definition) = member.split_at(close + 1);
            return Ok((name.trim().to_string(), definition.trim().to_string()));
        }
        if starts_with_keyword(member, "PRIMARY KEY") {
            let definition = &member["PRIMARY KEY".len()..];
            return Ok(("PRIMARY KEY".to_string(), definition.trim().to_string()));
        }
        match member.split_once(char::is_whitespace) {
            Some((name, definition)) if !definition.trim().is_empty() => {
                Ok((name.to_string(), definition.trim().to_string()))
            }
            _ => Err(Error::InvalidColumnDefinition {
                definition: member.to_string(),
            }),
        }
    }
}

/// Byte index of the parenthesis closing the first `(` in `text`.
fn closing_paren(text: &str) -> Option<usize> {
    let open = text.find('(')?;
    let mut depth = 0;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        phone TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    -- free text between statements is ignored
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price DECIMAL(10, 2) NOT NULL,
        stock INTEGER CHECK(stock >= 0),
        tags TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    create table order_items (
        order_id INTEGER,
        product_id INTEGER,
        quantity INTEGER CHECK(quantity > 0),
        price_per_item DECIMAL(10, 2) NOT NULL,
        PRIMARY KEY(order_id, product_id),
        FOREIGN KEY(order_id) REFERENCES orders(id) ON DELETE CASCADE,
        FOREIGN KEY(product_id) REFERENCES products(id)
    );

    CREATE TABLE IF NOT EXISTS product_reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER,
        rating INTEGER CHECK(rating >= 1 AND rating <= 5),
        review TEXT,
        FOREIGN KEY(product_id) REFERENCES products(id) ON DELETE CASCADE
    );
    "#;

    #[test]
    fn parses_every_statement_in_order() {
        let schema = DdlParser::parse(SHOP).unwrap();
        assert_eq!(
            schema.table_names().collect::<Vec<_>>(),
            vec!["customers", "products", "order_items", "product_reviews"]
        );
        assert_eq!(schema.table("customers").unwrap().len(), 5);
        assert_eq!(schema.table("products").unwrap().len(), 6);
        assert_eq!(schema.table("order_items").unwrap().len(), 7);
        assert_eq!(schema.table("product_reviews").unwrap().len(), 5);
    }

    #[test]
    fn column_is_split_on_first_whitespace() {
        let schema = DdlParser::parse(SHOP).unwrap();
        let customers = schema.table("customers").unwrap();
        assert_eq!(customers.get("id"), Some("INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert_eq!(customers.get("created_at"), Some("TIMESTAMP DEFAULT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn interior_commas_stay_inside_their_member() {
        let members = DdlParser::split_members(
            "id INTEGER, rating INTEGER CHECK(rating >= 1 AND rating <= 5), price DECIMAL(10, 2) NOT NULL",
        );
        assert_eq!(
            members,
            vec![
                "id INTEGER",
                "rating INTEGER CHECK(rating >= 1 AND rating <= 5)",
                "price DECIMAL(10, 2) NOT NULL",
            ]
        );

        let schema = DdlParser::parse(SHOP).unwrap();
        let products = schema.table("products").unwrap();
        assert_eq!(products.get("price"), Some("DECIMAL(10, 2) NOT NULL"));
    }

    #[test]
    fn constraints_fold_their_column_list_into_the_name() {
        let schema = DdlParser::parse(SHOP).unwrap();
        let items = schema.table("order_items").unwrap();
        assert_eq!(items.get("PRIMARY KEY"), Some("(order_id, product_id)"));
        assert_eq!(
            items.get("FOREIGN KEY(order_id)"),
            Some("REFERENCES orders(id) ON DELETE CASCADE")
        );
        assert_eq!(
            items.get("FOREIGN KEY(product_id)"),
            Some("REFERENCES products(id)")
        );
        assert_eq!(items.data_column_names().len(), 4);
    }

    #[test]
    fn duplicate_foreign_key_overwrites_earlier_member() {
        let ddl = "CREATE TABLE t (
            a INTEGER,
            FOREIGN KEY(a) REFERENCES x(id),
            FOREIGN KEY(a) REFERENCES y(id)
        );";
        let schema = DdlParser::parse(ddl).unwrap();
        let t = schema.table("t").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("FOREIGN KEY(a)"), Some("REFERENCES y(id)"));
    }

    #[test]
    fn bare_column_name_is_rejected() {
        let err = DdlParser::parse("CREATE TABLE t (id INTEGER, orphan);").unwrap_err();
        assert!(matches!(err, Error::InvalidColumnDefinition { ref definition } if definition == "orphan"));
    }

    #[test]
    fn missing_table_name_is_rejected() {
        let err = DdlParser::table_name("CREATE TABLE (id INTEGER);").unwrap_err();
        assert!(matches!(err, Error::TableNameNotFound { .. }));
    }

    #[test]
    fn missing_body_is_rejected() {
        let err = DdlParser::body("CREATE TABLE t;").unwrap_err();
        assert!(matches!(err, Error::ColumnsNotFound { .. }));
    }

    #[test]
    fn text_without_statements_yields_empty_schema() {
        let schema = DdlParser::parse("SELECT 1; -- nothing here").unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn keyword_prefixed_column_names_stay_data_columns() {
        let schema = DdlParser::parse(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, checksum TEXT, unique_code TEXT, \
             name TEXT, UNIQUE (name), CHECK (length(name) > 0));",
        )
        .unwrap();
        let t = schema.table("t").unwrap();
        assert_eq!(t.data_column_names(), vec!["id", "checksum", "unique_code", "name"]);
        assert_eq!(t.constraints().count(), 2);
        assert_eq!(t.get("checksum"), Some("TEXT"));
    }

    #[test]
    fn bare_primary_key_keeps_literal_name() {
        let (name, definition) = DdlParser::parse_member("PRIMARY KEY (a, b)").unwrap();
        assert_eq!(name, "PRIMARY KEY");
        assert_eq!(definition, "(a, b)");
    }
}
