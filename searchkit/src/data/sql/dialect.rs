//! SQL dialect trait for multi-database support

/// SQL dialect trait for generating database-specific SQL
pub trait SqlDialect: Send + Sync + std::fmt::Debug {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote an identifier, escaping embedded quotes
    ///
    /// Dotted names are quoted per segment (`t.col` -> `"t"."col"`).
    fn quote_ident(&self, ident: &str) -> String {
        ident
            .split('.')
            .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Generate LIMIT/OFFSET clause
    fn limit_offset(&self, limit: u64, offset: u64) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }
}
