//! SQL rendering for the relational backend
//!
//! Predicates are rendered into an [`SqlQuery`] through a [`SqlDialect`],
//! which owns the syntax that differs between databases (placeholders and
//! identifier quoting).

mod dialect;
mod postgres_dialect;
mod query;
mod sqlite_dialect;

pub use dialect::SqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use query::{SqlPagination, SqlParams, SqlQuery};
pub use sqlite_dialect::SqliteDialect;
