//! SQL query value built for a single request

use super::SqlDialect;
use crate::data::types::SortDirection;
use crate::filters::Scalar;
use crate::utils::sql::contains_pattern;

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SqlParams {
    pub values: Vec<Scalar>,
}

/// Page window applied to a relational query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPagination {
    pub page: u64,
    pub size: u64,
}

impl SqlPagination {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// SELECT over one table with ANDed conditions
#[derive(Debug)]
pub struct SqlQuery {
    dialect: &'static dyn SqlDialect,
    table: String,
    conditions: Vec<String>,
    params: SqlParams,
    order_by: Vec<String>,
    pagination: Option<SqlPagination>,
    relations: Vec<String>,
}

impl SqlQuery {
    pub fn new(dialect: &'static dyn SqlDialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            conditions: Vec::new(),
            params: SqlParams::default(),
            order_by: Vec::new(),
            pagination: None,
            relations: Vec::new(),
        }
    }

    fn bind(&mut self, value: Scalar) -> String {
        self.params.values.push(value);
        self.dialect.placeholder(self.params.values.len())
    }

    fn col(&self, field: &str) -> String {
        self.dialect.quote_ident(field)
    }

    fn placeholders(&mut self, values: &[Scalar]) -> String {
        values
            .iter()
            .map(|v| self.bind(v.clone()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn where_eq(&mut self, field: &str, value: &Scalar) {
        let col = self.col(field);
        let ph = self.bind(value.clone());
        self.conditions.push(format!("{} = {}", col, ph));
    }

    /// Empty lists match nothing
    pub fn where_in(&mut self, field: &str, values: &[Scalar]) {
        if values.is_empty() {
            self.conditions.push("1=0".to_string());
            return;
        }
        let col = self.col(field);
        let placeholders = self.placeholders(values);
        self.conditions.push(format!("{} IN ({})", col, placeholders));
    }

    pub fn where_not(&mut self, field: &str, value: &Scalar) {
        let col = self.col(field);
        let ph = self.bind(value.clone());
        self.conditions.push(format!("{} <> {}", col, ph));
    }

    /// Empty lists exclude nothing
    pub fn where_not_in(&mut self, field: &str, values: &[Scalar]) {
        if values.is_empty() {
            return;
        }
        let col = self.col(field);
        let placeholders = self.placeholders(values);
        self.conditions
            .push(format!("{} NOT IN ({})", col, placeholders));
    }

    /// Comparison against a bound; `op` is one of `>=`, `<=`, `>`, `<`
    pub fn where_cmp(&mut self, field: &str, op: &str, bound: &str) {
        let col = self.col(field);
        let ph = self.bind(Scalar::Text(bound.to_string()));
        self.conditions.push(format!("{} {} {}", col, op, ph));
    }

    /// Substring match with LIKE metacharacters escaped
    pub fn where_like(&mut self, field: &str, needle: &str) {
        let col = self.col(field);
        let ph = self.bind(Scalar::Text(contains_pattern(needle)));
        self.conditions
            .push(format!("{} LIKE {} ESCAPE '\\'", col, ph));
    }

    pub fn where_not_null(&mut self, field: &str) {
        let col = self.col(field);
        self.conditions.push(format!("{} IS NOT NULL", col));
    }

    pub fn order_by(&mut self, field: &str, direction: SortDirection) {
        let col = self.col(field);
        self.order_by.push(format!("{} {}", col, direction.as_sql()));
    }

    pub fn paginate(&mut self, page: u64, size: u64) {
        self.pagination = Some(SqlPagination { page, size });
    }

    pub fn with(&mut self, relations: &[String]) {
        self.relations.extend(relations.iter().cloned());
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[Scalar] {
        &self.params.values
    }

    pub fn pagination(&self) -> Option<SqlPagination> {
        self.pagination
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    /// WHERE body; `1=1` when unfiltered
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    /// Data query, including order and page window
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "SELECT * FROM {} WHERE {}",
            self.col(&self.table),
            self.where_clause()
        );
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(p) = self.pagination {
            sql.push(' ');
            sql.push_str(&self.dialect.limit_offset(p.size, p.offset()));
        }
        sql
    }

    /// Count query over the same conditions, ignoring order and page window
    pub fn to_count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.col(&self.table),
            self.where_clause()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{PostgresDialect, SqliteDialect};

    #[test]
    fn empty_query_selects_everything() {
        let query = SqlQuery::new(&SqliteDialect, "students");
        assert_eq!(query.to_sql(), "SELECT * FROM \"students\" WHERE 1=1");
        assert_eq!(
            query.to_count_sql(),
            "SELECT COUNT(*) FROM \"students\" WHERE 1=1"
        );
        assert!(query.params().is_empty());
    }

    #[test]
    fn conditions_are_anded_in_order() {
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.where_in("course_id", &[Scalar::Int(111), Scalar::Int(222)]);
        query.where_not("grade", &Scalar::Int(2));
        query.where_cmp("day", ">", "2019-06-01");
        query.where_like("real_name", "50%_off");
        query.where_not_null("email");

        assert_eq!(
            query.where_clause(),
            "\"course_id\" IN (?, ?) AND \"grade\" <> ? AND \"day\" > ? \
             AND \"real_name\" LIKE ? ESCAPE '\\' AND \"email\" IS NOT NULL"
        );
        assert_eq!(
            query.params(),
            &[
                Scalar::Int(111),
                Scalar::Int(222),
                Scalar::Int(2),
                Scalar::Text("2019-06-01".to_string()),
                Scalar::Text("%50\\%\\_off%".to_string()),
            ]
        );
    }

    #[test]
    fn postgres_placeholders_are_numbered() {
        let mut query = SqlQuery::new(&PostgresDialect, "students");
        query.where_eq("school_id", &Scalar::Int(1));
        query.where_not_in("grade", &[Scalar::Int(2), Scalar::Int(3)]);
        assert_eq!(
            query.where_clause(),
            "\"school_id\" = $1 AND \"grade\" NOT IN ($2, $3)"
        );
    }

    #[test]
    fn empty_lists() {
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.where_in("id", &[]);
        query.where_not_in("id", &[]);
        assert_eq!(query.where_clause(), "1=0");
    }

    #[test]
    fn order_and_page_window() {
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.order_by("grade", SortDirection::Desc);
        query.order_by("id", SortDirection::Asc);
        query.paginate(3, 20);
        assert_eq!(
            query.to_sql(),
            "SELECT * FROM \"students\" WHERE 1=1 ORDER BY \"grade\" DESC, \"id\" ASC LIMIT 20 OFFSET 40"
        );
        assert_eq!(query.pagination().map(|p| p.offset()), Some(40));
        assert_eq!(
            query.to_count_sql(),
            "SELECT COUNT(*) FROM \"students\" WHERE 1=1"
        );
    }
}
