//! PostgreSQL SQL dialect implementation
//!
//! Used for rendering only; no executor ships for PostgreSQL.

use super::SqlDialect;

/// PostgreSQL SQL dialect
#[derive(Debug)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}
