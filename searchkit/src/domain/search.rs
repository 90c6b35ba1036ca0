//! Search orchestration
//!
//! One call runs the whole pipeline in order: compile the filter map, render
//! predicates into a fresh backend query, apply directives, sort, pagination
//! and includes, execute, then normalize. The query value never outlives the
//! call, so an orchestrator can be shared across concurrent requests.

use std::sync::Arc;

use crate::data::error::SearchError;
use crate::data::traits::QueryBackend;
use crate::data::types::{ResultEnvelope, SearchRequest};
use crate::filters::{CompileOptions, FilterSpec, compile};

pub struct SearchOrchestrator<B: QueryBackend> {
    spec: Arc<FilterSpec>,
    backend: B,
}

impl<B: QueryBackend> SearchOrchestrator<B> {
    pub fn new(spec: Arc<FilterSpec>, backend: B) -> Self {
        Self { spec, backend }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<ResultEnvelope, SearchError> {
        let options = CompileOptions {
            existence_pass: B::SUPPORTS_EXISTS,
        };
        let predicates = compile(&self.spec, &request.filters, options)?;

        let mut query = self.backend.new_query();
        for predicate in &predicates {
            self.backend.render(&mut query, predicate);
        }
        self.backend.apply_directives(&mut query, &request.filters);
        self.backend.apply_sort(&mut query, &request.sort);
        self.backend.apply_pagination(&mut query, &request.page)?;

        let includes = self.spec.allowed_includes(&request.include);
        if !includes.is_empty() {
            self.backend.apply_include(&mut query, &includes);
        }

        if let Some(aggs) = &request.aggs {
            tracing::debug!(aggs = %aggs, "Ignoring aggregation directive");
        }

        let raw = self.backend.execute(query).await?;
        let envelope = self.backend.normalize(raw, &request.page);
        tracing::debug!(
            backend = self.backend.name(),
            predicates = predicates.len(),
            total = envelope.meta.total,
            returned = envelope.list.len(),
            "Search complete"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::relational::{RelationDef, RelationalBackend, SqliteExecutor};
    use crate::data::search_engine::{SearchClient, SearchEngineBackend, SearchParams, SearchResponse};
    use crate::data::types::{PageMeta, SortDirection, SortSpec};
    use crate::filters::{FilterMap, FilterValue, Predicate, Scalar, parse_filter_map};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    fn students_spec() -> Arc<FilterSpec> {
        let spec = FilterSpec::builder()
            .normal(["course_id", "school_id"])
            .not(["not_grade"])
            .range(["range_day"])
            .contain(["contain_real_name"])
            .special(["keyword"])
            .handler("keyword", |predicates, value| {
                for word in value.as_slice() {
                    predicates.push(Predicate::contains("real_name", word.to_string()));
                }
                Ok(())
            })
            .includes(["course"])
            .build()
            .unwrap();
        Arc::new(spec)
    }

    async fn sqlite_orchestrator() -> SearchOrchestrator<RelationalBackend<SqliteExecutor>> {
        let executor = SqliteExecutor::connect("sqlite::memory:", 1).await.unwrap();
        sqlx::query(
            "CREATE TABLE courses (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
             CREATE TABLE students (id INTEGER PRIMARY KEY, course_id INTEGER, school_id INTEGER,
                                    grade INTEGER, day TEXT, real_name TEXT);
             INSERT INTO courses (id, title) VALUES (111, 'Math'), (222, 'Art');
             INSERT INTO students (id, course_id, school_id, grade, day, real_name) VALUES
                (1, 111, 1, 1, '2019-06-05', 'Ann Lee'),
                (2, 222, 1, 2, '2019-06-20', 'Bob Stone'),
                (3, 111, 1, 3, '2019-07-02', 'Cid Lee'),
                (4, 333, 2, 1, '2019-06-10', 'Dee 50%'),
                (5, 222, 1, 4, '2019-05-30', 'Eve Park');",
        )
        .execute(executor.pool())
        .await
        .unwrap();
        let executor =
            executor.with_relation("course", RelationDef::belongs_to("courses", "course_id", "id"));
        SearchOrchestrator::new(students_spec(), RelationalBackend::new(executor, "students"))
    }

    fn ids(list: &[Value]) -> Vec<i64> {
        list.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn empty_request_returns_everything_unpaged() {
        let orchestrator = sqlite_orchestrator().await;
        let envelope = orchestrator
            .search(&SearchRequest::new(FilterMap::new()))
            .await
            .unwrap();
        assert_eq!(ids(&envelope.list), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            envelope.meta,
            PageMeta {
                total: 5,
                size: 5,
                page: 1,
                total_page: 1
            }
        );
    }

    #[tokio::test]
    async fn blank_values_filter_nothing() {
        let orchestrator = sqlite_orchestrator().await;
        let filters = parse_filter_map(
            r#"{"course_id": [], "not_grade": null, "contain_real_name": "", "range_day": []}"#,
        )
        .unwrap();
        let envelope = orchestrator.search(&SearchRequest::new(filters)).await.unwrap();
        assert_eq!(envelope.meta.total, 5);
    }

    #[tokio::test]
    async fn categories_combine_with_and() {
        let orchestrator = sqlite_orchestrator().await;
        let filters = parse_filter_map(
            r#"{
                "course_id": [111, 222],
                "not_grade": [4],
                "range_day": [">=2019-06-01", "<2019-07-01", "2019-01-01"],
                "unknown_key": "ignored"
            }"#,
        )
        .unwrap();
        let request = SearchRequest::new(filters).sort(SortSpec::new().then("id", SortDirection::Desc));
        let envelope = orchestrator.search(&request).await.unwrap();
        assert_eq!(ids(&envelope.list), vec![2, 1]);
    }

    #[tokio::test]
    async fn contains_escapes_wildcards() {
        let orchestrator = sqlite_orchestrator().await;
        let mut filters = FilterMap::new();
        filters.insert("contain_real_name".to_string(), FilterValue::from("50%"));
        let envelope = orchestrator.search(&SearchRequest::new(filters)).await.unwrap();
        assert_eq!(ids(&envelope.list), vec![4]);
    }

    #[tokio::test]
    async fn special_handler_adds_predicates() {
        let orchestrator = sqlite_orchestrator().await;
        let mut filters = FilterMap::new();
        filters.insert("keyword".to_string(), FilterValue::from("Lee"));
        filters.insert("school_id".to_string(), FilterValue::from(1i64));
        let envelope = orchestrator.search(&SearchRequest::new(filters)).await.unwrap();
        assert_eq!(ids(&envelope.list), vec![1, 3]);
    }

    #[tokio::test]
    async fn paginated_meta_and_window() {
        let orchestrator = sqlite_orchestrator().await;
        let request = SearchRequest::new(FilterMap::new())
            .page(2, 2)
            .sort(SortSpec::new().then("id", SortDirection::Asc));
        let envelope = orchestrator.search(&request).await.unwrap();
        assert_eq!(ids(&envelope.list), vec![3, 4]);
        assert_eq!(
            envelope.meta,
            PageMeta {
                total: 5,
                size: 2,
                page: 2,
                total_page: 3
            }
        );
    }

    #[tokio::test]
    async fn includes_are_whitelisted() {
        let orchestrator = sqlite_orchestrator().await;
        let mut filters = FilterMap::new();
        filters.insert("course_id".to_string(), FilterValue::from(111i64));
        let request = SearchRequest::new(filters)
            .sort(SortSpec::new().then("id", SortDirection::Asc))
            .include(["course", "school"]);
        let envelope = orchestrator.search(&request).await.unwrap();
        assert_eq!(envelope.list[0]["course"], json!({"id": 111, "title": "Math"}));
        assert!(envelope.list[0].get("school").is_none());
    }

    #[tokio::test]
    async fn exist_field_is_ignored_by_relational() {
        let orchestrator = sqlite_orchestrator().await;
        let mut filters = FilterMap::new();
        filters.insert("exist_field".to_string(), FilterValue::list(["missing_column"]));
        let envelope = orchestrator.search(&SearchRequest::new(filters)).await.unwrap();
        assert_eq!(envelope.meta.total, 5);
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let spec = FilterSpec::builder()
            .special(["strict"])
            .handler("strict", |_, _| Err(SearchError::invalid_filters("strict rejects everything")))
            .build()
            .unwrap();
        let executor = SqliteExecutor::connect("sqlite::memory:", 1).await.unwrap();
        let orchestrator =
            SearchOrchestrator::new(Arc::new(spec), RelationalBackend::new(executor, "students"));
        let mut filters = FilterMap::new();
        filters.insert("strict".to_string(), FilterValue::from(true));
        let err = orchestrator
            .search(&SearchRequest::new(filters))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidFilters(_)));
    }

    /// Captures the body and answers with a fixed hit list
    struct CannedClient {
        sent: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl SearchClient for CannedClient {
        async fn search(&self, params: SearchParams) -> Result<SearchResponse, SearchError> {
            self.sent.lock().unwrap().push(params.body);
            Ok(serde_json::from_value(json!({
                "hits": {"total": {"value": 45, "relation": "eq"},
                         "hits": [{"_source": {"id": 21}}, {"_source": {"id": 22}}]}
            }))
            .unwrap())
        }
    }

    fn search_orchestrator() -> SearchOrchestrator<SearchEngineBackend<CannedClient>> {
        let client = CannedClient {
            sent: Mutex::new(Vec::new()),
        };
        SearchOrchestrator::new(students_spec(), SearchEngineBackend::new(client, "students"))
    }

    #[tokio::test]
    async fn search_engine_body_and_meta() {
        let orchestrator = search_orchestrator();
        let filters = parse_filter_map(
            r#"{
                "school_id": 1,
                "not_grade": [2, 3],
                "range_day": ">2019-06-01",
                "contain_real_name": "lee",
                "exist_field": ["email"],
                "_source": ["id"]
            }"#,
        )
        .unwrap();
        let request = SearchRequest::new(filters)
            .page(2, 20)
            .sort(SortSpec::new().then("day", SortDirection::Desc));
        let envelope = orchestrator.search(&request).await.unwrap();

        let body = orchestrator.backend_body();
        assert_eq!(
            body,
            json!({
                "query": {"bool": {
                    "filter": {"bool": {
                        "must": [
                            {"term": {"school_id": 1}},
                            {"range": {"day": {"gt": "2019-06-01"}}},
                            {"match": {"real_name": "lee"}}
                        ],
                        "must_not": [{"terms": {"grade": [2, 3]}}]
                    }},
                    "must": {"bool": {"must": [{"exists": {"field": "email"}}]}}
                }},
                "_source": ["id"],
                "sort": [{"day": {"order": "desc"}}],
                "from": 20,
                "size": 20
            })
        );
        assert_eq!(
            envelope.meta,
            PageMeta {
                total: 45,
                size: 20,
                page: 2,
                total_page: 3
            }
        );
    }

    #[tokio::test]
    async fn search_engine_rejects_deep_pages_before_sending() {
        let orchestrator = search_orchestrator();
        let request = SearchRequest::new(FilterMap::new()).page(501, 20);
        let err = orchestrator.search(&request).await.unwrap_err();
        assert!(matches!(err, SearchError::PageTooLarge { from: 10000, .. }));
        assert!(orchestrator.backend().client().sent.lock().unwrap().is_empty());

        let request = SearchRequest::new(FilterMap::new()).page(500, 20);
        orchestrator.search(&request).await.unwrap();
        assert_eq!(orchestrator.backend_body()["from"], json!(9980));
    }

    #[tokio::test]
    async fn search_engine_empty_request_is_match_all() {
        let orchestrator = search_orchestrator();
        let mut request = SearchRequest::new(FilterMap::new());
        request.aggs = Some(json!({"by_grade": {"terms": {"field": "grade"}}}));
        let envelope = orchestrator.search(&request).await.unwrap();
        assert_eq!(orchestrator.backend_body(), json!({"from": 0, "size": 10000}));
        assert_eq!(envelope.meta.size, 2);
        assert_eq!(envelope.meta.total_page, 23);
    }

    impl SearchOrchestrator<SearchEngineBackend<CannedClient>> {
        fn backend_body(&self) -> Value {
            self.backend()
                .client()
                .sent
                .lock()
                .unwrap()
                .last()
                .cloned()
                .unwrap()
        }
    }

    #[test]
    fn scalar_and_list_values_pick_predicate() {
        let spec = students_spec();
        let mut filters = FilterMap::new();
        filters.insert("course_id".to_string(), FilterValue::from(Scalar::Int(111)));
        filters.insert("school_id".to_string(), FilterValue::list([1i64, 2]));
        let predicates = compile(&spec, &filters, CompileOptions::default()).unwrap();
        assert_eq!(
            predicates.into_vec(),
            vec![
                Predicate::equals("course_id", 111i64),
                Predicate::is_in("school_id", vec![Scalar::Int(1), Scalar::Int(2)]),
            ]
        );
    }
}
