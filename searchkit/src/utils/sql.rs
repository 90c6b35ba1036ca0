//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Pair with `ESCAPE '\'` in the LIKE clause.
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// LIKE pattern matching `needle` anywhere in the column
///
/// # Example
///
/// ```
/// use searchkit::utils::sql::contains_pattern;
///
/// assert_eq!(contains_pattern("100% match_test"), "%100\\% match\\_test%");
/// ```
pub fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like_pattern(needle))
}
