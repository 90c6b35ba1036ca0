//! SQLite executor
//!
//! Runs rendered queries on a sqlx pool, decodes rows into JSON objects by
//! their storage class, and eager-loads configured relations with chunked
//! `IN (...)` queries per relation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use super::executor::{Paginator, RelationDef, RelationKind, RelationalExecutor};
use crate::data::error::SearchError;
use crate::data::sql::{SqlDialect, SqlQuery, SqliteDialect};
use crate::data::types::Record;
use crate::filters::Scalar;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Parent keys bound per eager-load query, below SQLite's 32766 variable limit
const RELATION_KEY_CHUNK: usize = 30_000;

pub struct SqliteExecutor {
    pool: SqlitePool,
    relations: HashMap<String, RelationDef>,
}

impl SqliteExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            relations: HashMap::new(),
        }
    }

    /// Open a pool for `url` (e.g. `sqlite://data.db` or `sqlite::memory:`)
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, SearchError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::debug!(%url, max_connections, "SqliteExecutor connected");
        Ok(Self::new(pool))
    }

    /// Register how a relation is loaded
    pub fn with_relation(mut self, name: impl Into<String>, def: RelationDef) -> Self {
        self.relations.insert(name.into(), def);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch(&self, sql: &str, params: &[Scalar]) -> Result<Vec<Record>, SearchError> {
        tracing::debug!(%sql, params = params.len(), "Executing relational query");
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await?;
        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn count(&self, query: &SqlQuery) -> Result<u64, SearchError> {
        let sql = query.to_count_sql();
        tracing::debug!(%sql, "Counting relational query");
        let row = bind_all(sqlx::query(&sql), query.params())
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get(0)?;
        Ok(total.max(0) as u64)
    }

    async fn load_relations(
        &self,
        records: &mut [Record],
        relations: &[String],
    ) -> Result<(), SearchError> {
        for name in relations {
            let def = self
                .relations
                .get(name)
                .ok_or_else(|| SearchError::UnknownRelation(name.clone()))?;

            let mut keys: Vec<Scalar> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();
            for record in records.iter() {
                let Some(value) = record.get(&def.parent_key) else {
                    continue;
                };
                if let (Some(key), Some(scalar)) = (key_of(value), scalar_of(value))
                    && seen.insert(key)
                {
                    keys.push(scalar);
                }
            }

            let mut grouped: HashMap<String, Vec<Record>> = HashMap::new();
            for chunk in keys.chunks(RELATION_KEY_CHUNK) {
                let mut related = SqlQuery::new(&SqliteDialect, def.table.clone());
                related.where_in(&def.related_key, chunk);
                let sql = related.to_sql();
                for row in self.fetch(&sql, related.params()).await? {
                    if let Some(key) = row.get(&def.related_key).and_then(key_of) {
                        grouped.entry(key).or_default().push(row);
                    }
                }
            }

            for record in records.iter_mut() {
                let key = record.get(&def.parent_key).and_then(key_of);
                let related = key
                    .and_then(|k| grouped.get(&k))
                    .cloned()
                    .unwrap_or_default();
                let value = match def.kind {
                    RelationKind::HasMany => Value::Array(related),
                    RelationKind::BelongsTo => related.into_iter().next().unwrap_or(Value::Null),
                };
                if let Value::Object(map) = record {
                    map.insert(name.clone(), value);
                }
            }
            tracing::trace!(relation = %name, parents = records.len(), "Loaded relation");
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalExecutor for SqliteExecutor {
    fn dialect(&self) -> &'static dyn SqlDialect {
        &SqliteDialect
    }

    async fn paginate(&self, query: &SqlQuery) -> Result<Paginator, SearchError> {
        let window = query.pagination().ok_or_else(|| {
            SearchError::Config("paginate requires a page window on the query".to_string())
        })?;
        let total = self.count(query).await?;
        let mut data = self.fetch(&query.to_sql(), query.params()).await?;
        self.load_relations(&mut data, query.relations()).await?;
        Ok(Paginator::new(data, total, window.size, window.page))
    }

    async fn get(&self, query: &SqlQuery) -> Result<Vec<Record>, SearchError> {
        let mut data = self.fetch(&query.to_sql(), query.params()).await?;
        self.load_relations(&mut data, query.relations()).await?;
        Ok(data)
    }
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &'q [Scalar]) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            Scalar::Bool(b) => query.bind(*b),
            Scalar::Int(i) => query.bind(*i),
            Scalar::Float(f) => query.bind(*f),
            Scalar::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

/// Decode a row by each value's storage class
fn row_to_record(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut map = serde_json::Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let storage = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };
        let value = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER") => Value::from(row.try_get::<i64, _>(idx)?),
            Some("REAL") => Value::from(row.try_get::<f64, _>(idx)?),
            Some("BLOB") => {
                let bytes = row.try_get::<Vec<u8>, _>(idx)?;
                Value::from(String::from_utf8_lossy(&bytes).into_owned())
            }
            Some(_) => Value::from(row.try_get::<String, _>(idx)?),
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Join key for relation matching; null never matches
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn scalar_of(value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        Value::String(s) => Some(Scalar::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_executor() -> SqliteExecutor {
        let executor = SqliteExecutor::connect("sqlite::memory:", 1).await.unwrap();
        sqlx::query(
            "CREATE TABLE courses (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
             CREATE TABLE students (id INTEGER PRIMARY KEY, course_id INTEGER, real_name TEXT, score REAL, email TEXT);
             INSERT INTO courses (id, title) VALUES (1, 'Math'), (2, 'Art');
             INSERT INTO students (id, course_id, real_name, score, email) VALUES
                (1, 1, 'Ann', 91.5, 'ann@example.com'),
                (2, 1, 'Bob', 78.0, NULL),
                (3, 2, 'Cid', 66.5, 'cid@example.com');",
        )
        .execute(executor.pool())
        .await
        .unwrap();
        executor
            .with_relation("course", RelationDef::belongs_to("courses", "course_id", "id"))
            .with_relation("students", RelationDef::has_many("students", "id", "course_id"))
    }

    #[tokio::test]
    async fn get_decodes_storage_classes() {
        let executor = setup_executor().await;
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.where_eq("id", &Scalar::Int(2));
        let rows = executor.get(&query).await.unwrap();
        assert_eq!(
            rows,
            vec![json!({"id": 2, "course_id": 1, "real_name": "Bob", "score": 78.0, "email": null})]
        );
    }

    #[tokio::test]
    async fn paginate_counts_all_matches() {
        let executor = setup_executor().await;
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.order_by("id", crate::data::types::SortDirection::Asc);
        query.paginate(2, 2);
        let page = executor.paginate(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.per_page, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0]["id"], json!(3));
    }

    #[tokio::test]
    async fn paginate_without_window_is_config_error() {
        let executor = setup_executor().await;
        let query = SqlQuery::new(&SqliteDialect, "students");
        let result = executor.paginate(&query).await;
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[tokio::test]
    async fn eager_loads_belongs_to() {
        let executor = setup_executor().await;
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.where_in("id", &[Scalar::Int(1), Scalar::Int(3)]);
        query.order_by("id", crate::data::types::SortDirection::Asc);
        query.with(&["course".to_string()]);
        let rows = executor.get(&query).await.unwrap();
        assert_eq!(rows[0]["course"], json!({"id": 1, "title": "Math"}));
        assert_eq!(rows[1]["course"], json!({"id": 2, "title": "Art"}));
    }

    #[tokio::test]
    async fn eager_loads_has_many() {
        let executor = setup_executor().await;
        let mut query = SqlQuery::new(&SqliteDialect, "courses");
        query.order_by("id", crate::data::types::SortDirection::Asc);
        query.with(&["students".to_string()]);
        let rows = executor.get(&query).await.unwrap();
        let names: Vec<&str> = rows[0]["students"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["real_name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Ann"));
        assert!(names.contains(&"Bob"));
        assert_eq!(rows[1]["students"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_relation_is_error() {
        let executor = setup_executor().await;
        let mut query = SqlQuery::new(&SqliteDialect, "students");
        query.with(&["teacher".to_string()]);
        let result = executor.get(&query).await;
        assert!(matches!(result, Err(SearchError::UnknownRelation(name)) if name == "teacher"));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let executor = setup_executor().await;
        let query = SqlQuery::new(&SqliteDialect, "missing_table");
        let result = executor.get(&query).await;
        assert!(matches!(result, Err(SearchError::Sql(_))));
    }

    #[tokio::test]
    async fn eager_loads_past_variable_limit() {
        let executor = SqliteExecutor::connect("sqlite::memory:", 1).await.unwrap();
        sqlx::query(
            "CREATE TABLE parents (id INTEGER PRIMARY KEY);
             CREATE TABLE kids (id INTEGER PRIMARY KEY, parent_id INTEGER);
             INSERT INTO parents (id)
                WITH RECURSIVE seq(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM seq WHERE x < 33000)
                SELECT x FROM seq;
             INSERT INTO kids (id, parent_id) VALUES (1, 1), (2, 1), (3, 32999), (4, 33000);",
        )
        .execute(executor.pool())
        .await
        .unwrap();
        let executor = executor.with_relation("kids", RelationDef::has_many("kids", "id", "parent_id"));

        let mut query = SqlQuery::new(&SqliteDialect, "parents");
        query.order_by("id", crate::data::types::SortDirection::Asc);
        query.with(&["kids".to_string()]);
        let rows = executor.get(&query).await.unwrap();

        assert_eq!(rows.len(), 33_000);
        assert_eq!(rows[0]["kids"].as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["kids"], json!([]));
        assert_eq!(rows[32_998]["kids"], json!([{"id": 3, "parent_id": 32999}]));
        assert_eq!(rows[32_999]["kids"], json!([{"id": 4, "parent_id": 33000}]));
    }
}
