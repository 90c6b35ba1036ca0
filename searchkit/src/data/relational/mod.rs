//! Relational backend
//!
//! Renders predicates into an [`SqlQuery`] and hands it to a
//! [`RelationalExecutor`]. There is no page window limit here; any page may
//! be requested.

mod executor;
mod sqlite;

pub use executor::{Paginator, RelationDef, RelationKind, RelationalExecutor, RelationalRaw};
pub use sqlite::SqliteExecutor;

use async_trait::async_trait;

use crate::data::error::SearchError;
use crate::data::normalize::normalize_relational;
use crate::data::sql::SqlQuery;
use crate::data::traits::QueryBackend;
use crate::data::types::{PageSpec, ResultEnvelope, SortSpec};
use crate::filters::{RangeOp, Scalar};

pub struct RelationalBackend<E: RelationalExecutor> {
    executor: E,
    table: String,
}

impl<E: RelationalExecutor> RelationalBackend<E> {
    pub fn new(executor: E, table: impl Into<String>) -> Self {
        Self {
            executor,
            table: table.into(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[async_trait]
impl<E: RelationalExecutor> QueryBackend for RelationalBackend<E> {
    type Query = SqlQuery;
    type Raw = RelationalRaw;
    const SUPPORTS_EXISTS: bool = false;

    fn name(&self) -> &'static str {
        "relational"
    }

    fn new_query(&self) -> SqlQuery {
        SqlQuery::new(self.executor.dialect(), self.table.clone())
    }

    fn add_equals(&self, query: &mut SqlQuery, field: &str, value: &Scalar) {
        query.where_eq(field, value);
    }

    fn add_in(&self, query: &mut SqlQuery, field: &str, values: &[Scalar]) {
        query.where_in(field, values);
    }

    fn add_not_equals(&self, query: &mut SqlQuery, field: &str, value: &Scalar) {
        query.where_not(field, value);
    }

    fn add_not_in(&self, query: &mut SqlQuery, field: &str, values: &[Scalar]) {
        query.where_not_in(field, values);
    }

    fn add_range(&self, query: &mut SqlQuery, field: &str, op: RangeOp, bound: &str) {
        query.where_cmp(field, op.symbol(), bound);
    }

    fn add_contains(&self, query: &mut SqlQuery, field: &str, value: &str) {
        query.where_like(field, value);
    }

    fn add_exists(&self, query: &mut SqlQuery, field: &str) {
        query.where_not_null(field);
    }

    fn apply_sort(&self, query: &mut SqlQuery, sort: &SortSpec) {
        for (field, direction) in sort.iter() {
            query.order_by(field, direction);
        }
    }

    fn apply_pagination(&self, query: &mut SqlQuery, page: &PageSpec) -> Result<(), SearchError> {
        if page.is_paged() {
            query.paginate(page.page, page.size);
        }
        Ok(())
    }

    fn apply_include(&self, query: &mut SqlQuery, relations: &[String]) {
        query.with(relations);
    }

    async fn execute(&self, query: SqlQuery) -> Result<RelationalRaw, SearchError> {
        tracing::debug!(
            table = %query.table(),
            dialect = query.dialect().name(),
            sql = %query.to_sql(),
            relations = ?query.relations(),
            "Executing relational search"
        );
        if query.pagination().is_some() {
            self.executor.paginate(&query).await.map(RelationalRaw::Paginated)
        } else {
            self.executor.get(&query).await.map(RelationalRaw::All)
        }
    }

    fn normalize(&self, raw: RelationalRaw, _page: &PageSpec) -> ResultEnvelope {
        normalize_relational(raw)
    }
}
