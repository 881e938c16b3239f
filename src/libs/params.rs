//! Named query parameters.
//!
//! SQL in this crate is written with `:name` placeholders. The SQLite driver
//! binds by position, so before execution every `:name` is rewritten to a
//! numbered `?N` placeholder and the values are collected in that order.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::libs::error::{Error, Result};
use crate::libs::value::SqlValue;

/// Same identifier alphabet as the DDL parser's `\w`, minus a leading digit.
static COLON_NAMED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([\p{L}_]\w*)").expect("valid regex"));

/// Single-quoted literals, double-quoted identifiers and comments.
static SKIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|--[^\n]*|/\*[\s\S]*?\*/"#).expect("valid regex")
});

/// Ordered name -> value mapping. Setting a name twice replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<String, SqlValue>);

/// Equality filters of a repository call; clause order follows insertion order.
pub type Filters = Params;

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// SQL rewritten to positional placeholders plus its values in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Rewrite `:name` placeholders to `?N`. Repeated names share a number;
/// supplied values that are never referenced are ignored.
pub fn bind_named(sql: &str, params: &Params) -> Result<BoundQuery> {
    let skip_ranges: Vec<(usize, usize)> = SKIP_REGEX
        .find_iter(sql)
        .map(|m| (m.start(), m.end()))
        .collect();
    let is_skipped = |pos: usize| skip_ranges.iter().any(|(s, e)| pos >= *s && pos < *e);

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut values = Vec::new();
    let mut out = String::with_capacity(sql.len());
    let mut last_end = 0;

    for caps in COLON_NAMED_REGEX.captures_iter(sql) {
        let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // `a::text` is a cast, not a parameter
        if is_skipped(full.start()) || sql[..full.start()].ends_with(':') {
            continue;
        }
        let name = name.as_str();
        let position = match positions.get(name) {
            Some(&position) => position,
            None => {
                let value = params.get(name).ok_or_else(|| Error::MissingParameter {
                    name: name.to_string(),
                })?;
                values.push(value.clone());
                positions.insert(name, values.len());
                values.len()
            }
        };
        out.push_str(&sql[last_end..full.start()]);
        out.push_str(&format!("?{}", position));
        last_end = full.end();
    }
    out.push_str(&sql[last_end..]);

    Ok(BoundQuery { sql: out, values })
}
