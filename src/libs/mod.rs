pub mod config;
pub mod ddl;
pub mod error;
pub mod logging;
pub mod orm;
pub mod outcome;
pub mod params;
pub mod query_builder;
pub mod record;
pub mod repository;
pub mod schema;
pub mod sql_gen;
pub mod validator;
pub mod value;

// Re-export them for easier access from main.rs
pub use config::*;
pub use ddl::*;
pub use error::*;
pub use logging::*;
pub use orm::*;
pub use outcome::*;
pub use params::*;
pub use query_builder::{QueryBuilder, QueryMode};
pub use record::*;
pub use repository::*;
pub use schema::*;
pub use sql_gen::*;
pub use validator::*;
pub use value::*;
