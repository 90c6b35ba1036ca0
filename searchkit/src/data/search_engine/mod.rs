//! Search-engine backend
//!
//! Renders predicates into a boolean query body and enforces the engine's
//! deep-pagination window before any request is sent.

mod body;
mod client;
mod response;

pub use body::SearchQuery;
pub use client::{HttpSearchClient, SearchClient, SearchParams};
pub use response::{Hit, Hits, HitsTotal, SearchResponse};

use async_trait::async_trait;

use crate::core::constants::DEFAULT_MAX_RESULT_WINDOW;
use crate::data::error::SearchError;
use crate::data::normalize::normalize_search;
use crate::data::traits::QueryBackend;
use crate::data::types::{PageSpec, ResultEnvelope, SortSpec};
use crate::filters::{FilterMap, RangeOp, Scalar, present};

/// Reserved filter key copied to the body as a field projection
///
/// Only scalar and list forms are accepted; the object form
/// (`{"includes": [...]}`) is rejected by filter parsing.
pub const SOURCE_KEY: &str = "_source";

pub struct SearchEngineBackend<C: SearchClient> {
    client: C,
    index: String,
    doc_type: Option<String>,
    max_window: u64,
}

impl<C: SearchClient> SearchEngineBackend<C> {
    pub fn new(client: C, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            doc_type: None,
            max_window: DEFAULT_MAX_RESULT_WINDOW,
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_max_window(mut self, max_window: u64) -> Self {
        self.max_window = max_window;
        self
    }

    pub fn max_window(&self) -> u64 {
        self.max_window
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: SearchClient> QueryBackend for SearchEngineBackend<C> {
    type Query = SearchQuery;
    type Raw = SearchResponse;
    const SUPPORTS_EXISTS: bool = true;

    fn name(&self) -> &'static str {
        "search_engine"
    }

    fn new_query(&self) -> SearchQuery {
        SearchQuery::new()
    }

    fn add_equals(&self, query: &mut SearchQuery, field: &str, value: &Scalar) {
        query.term(field, value);
    }

    fn add_in(&self, query: &mut SearchQuery, field: &str, values: &[Scalar]) {
        query.terms(field, values);
    }

    fn add_not_equals(&self, query: &mut SearchQuery, field: &str, value: &Scalar) {
        query.not_term(field, value);
    }

    fn add_not_in(&self, query: &mut SearchQuery, field: &str, values: &[Scalar]) {
        query.not_terms(field, values);
    }

    fn add_range(&self, query: &mut SearchQuery, field: &str, op: RangeOp, bound: &str) {
        query.range(field, op, bound);
    }

    fn add_contains(&self, query: &mut SearchQuery, field: &str, value: &str) {
        query.matches(field, value);
    }

    fn add_exists(&self, query: &mut SearchQuery, field: &str) {
        query.exists(field);
    }

    fn apply_directives(&self, query: &mut SearchQuery, filters: &FilterMap) {
        if let Some(source) = present(filters, SOURCE_KEY) {
            query.source(source.to_json());
        }
    }

    fn apply_sort(&self, query: &mut SearchQuery, sort: &SortSpec) {
        for (field, direction) in sort.iter() {
            query.sort(field, direction);
        }
    }

    /// Unpaged requests ask for the whole window from offset 0
    fn apply_pagination(&self, query: &mut SearchQuery, page: &PageSpec) -> Result<(), SearchError> {
        let Some(from) = page.offset() else {
            query.window(0, self.max_window);
            return Ok(());
        };
        if from >= self.max_window {
            return Err(SearchError::PageTooLarge {
                page: page.page,
                size: page.size,
                from,
                max_window: self.max_window,
            });
        }
        query.window(from, page.size);
        Ok(())
    }

    async fn execute(&self, query: SearchQuery) -> Result<SearchResponse, SearchError> {
        let body = query.to_body();
        tracing::debug!(
            index = %self.index,
            clauses = query.clause_count(),
            from = query.from(),
            size = query.size(),
            body = %body,
            "Executing search query"
        );
        self.client
            .search(SearchParams {
                index: self.index.clone(),
                doc_type: self.doc_type.clone(),
                body,
            })
            .await
    }

    fn normalize(&self, raw: SearchResponse, page: &PageSpec) -> ResultEnvelope {
        normalize_search(raw, page)
    }
}
