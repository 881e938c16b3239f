//! Schema-driven data access on SQLite.
//!
//! A schema, given as `CREATE TABLE` text or as a table mapping, is parsed,
//! validated and turned into tables plus one [`Repository`] per table. Each
//! repository saves, loads and deletes runtime-typed [`Record`]s with SQL built
//! from the schema and the caller's equality filters.

mod libs;

pub use libs::*;
