//! Backend capability trait
//!
//! A backend renders backend-neutral predicates into its own query value,
//! applies sort and pagination, executes, and normalizes the raw result.
//! The query value is created fresh for each request by [`QueryBackend::new_query`]
//! and consumed by [`QueryBackend::execute`], so no request state lives on
//! the backend itself.

use async_trait::async_trait;

use crate::data::error::SearchError;
use crate::data::types::{PageSpec, ResultEnvelope, SortSpec};
use crate::filters::{FilterMap, Predicate, RangeOp, Scalar};

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Native query representation built for one request
    type Query: Send;

    /// Raw execution result before normalization
    type Raw: Send;

    /// Whether the compiler should read the reserved `exist_field` key
    const SUPPORTS_EXISTS: bool;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    fn new_query(&self) -> Self::Query;

    fn add_equals(&self, query: &mut Self::Query, field: &str, value: &Scalar);

    fn add_in(&self, query: &mut Self::Query, field: &str, values: &[Scalar]);

    fn add_not_equals(&self, query: &mut Self::Query, field: &str, value: &Scalar);

    fn add_not_in(&self, query: &mut Self::Query, field: &str, values: &[Scalar]);

    fn add_range(&self, query: &mut Self::Query, field: &str, op: RangeOp, bound: &str);

    fn add_contains(&self, query: &mut Self::Query, field: &str, value: &str);

    fn add_exists(&self, query: &mut Self::Query, field: &str);

    /// Reserved, non-predicate keys of the filter map (e.g. `_source`)
    fn apply_directives(&self, _query: &mut Self::Query, _filters: &FilterMap) {}

    fn apply_sort(&self, query: &mut Self::Query, sort: &SortSpec);

    fn apply_pagination(&self, query: &mut Self::Query, page: &PageSpec)
    -> Result<(), SearchError>;

    /// Attach already-whitelisted relations for eager loading
    fn apply_include(&self, _query: &mut Self::Query, _relations: &[String]) {}

    async fn execute(&self, query: Self::Query) -> Result<Self::Raw, SearchError>;

    fn normalize(&self, raw: Self::Raw, page: &PageSpec) -> ResultEnvelope;

    /// Dispatch a predicate to the matching `add_*` primitive
    fn render(&self, query: &mut Self::Query, predicate: &Predicate) {
        match predicate {
            Predicate::Equals { field, value } => self.add_equals(query, field, value),
            Predicate::In { field, values } => self.add_in(query, field, values),
            Predicate::NotEquals { field, value } => self.add_not_equals(query, field, value),
            Predicate::NotIn { field, values } => self.add_not_in(query, field, values),
            Predicate::Range { field, op, bound } => self.add_range(query, field, *op, bound),
            Predicate::Contains { field, value } => self.add_contains(query, field, value),
            Predicate::Exists { field } => self.add_exists(query, field),
        }
    }
}
