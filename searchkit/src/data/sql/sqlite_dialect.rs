//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
#[derive(Debug)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_quote_ident() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.quote_ident("real_name"), "\"real_name\"");
        assert_eq!(dialect.quote_ident("s.grade"), "\"s\".\"grade\"");
        assert_eq!(dialect.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(SqliteDialect.limit_offset(20, 40), "LIMIT 20 OFFSET 40");
    }
}
