//! Search request body built for a single request

use serde_json::{Map, Value, json};

use crate::data::types::SortDirection;
use crate::filters::{RangeOp, Scalar};

/// Accumulated boolean query plus sort, window and projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    must: Vec<Value>,
    must_not: Vec<Value>,
    exists: Vec<Value>,
    sort: Vec<Value>,
    source: Option<Value>,
    from: u64,
    size: u64,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&mut self, field: &str, value: &Scalar) {
        self.must.push(json!({"term": {field: value.to_json()}}));
    }

    pub fn terms(&mut self, field: &str, values: &[Scalar]) {
        self.must.push(json!({"terms": {field: scalars(values)}}));
    }

    pub fn not_term(&mut self, field: &str, value: &Scalar) {
        self.must_not.push(json!({"term": {field: value.to_json()}}));
    }

    pub fn not_terms(&mut self, field: &str, values: &[Scalar]) {
        self.must_not.push(json!({"terms": {field: scalars(values)}}));
    }

    pub fn range(&mut self, field: &str, op: RangeOp, bound: &str) {
        self.must
            .push(json!({"range": {field: {op.search_key(): bound}}}));
    }

    pub fn matches(&mut self, field: &str, value: &str) {
        self.must.push(json!({"match": {field: value}}));
    }

    pub fn exists(&mut self, field: &str) {
        self.exists.push(json!({"exists": {"field": field}}));
    }

    pub fn sort(&mut self, field: &str, direction: SortDirection) {
        self.sort
            .push(json!({field: {"order": direction.to_string()}}));
    }

    pub fn source(&mut self, source: Value) {
        self.source = Some(source);
    }

    pub fn window(&mut self, from: u64, size: u64) {
        self.from = from;
        self.size = size;
    }

    pub fn from(&self) -> u64 {
        self.from
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of filter and exists clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.must_not.len() + self.exists.len()
    }

    /// Request body; `query` is left out when nothing filters
    pub fn to_body(&self) -> Value {
        let mut bool_query = Map::new();
        if !self.must.is_empty() || !self.must_not.is_empty() {
            let mut filter = Map::new();
            if !self.must.is_empty() {
                filter.insert("must".to_string(), Value::Array(self.must.clone()));
            }
            if !self.must_not.is_empty() {
                filter.insert("must_not".to_string(), Value::Array(self.must_not.clone()));
            }
            bool_query.insert("filter".to_string(), json!({"bool": filter}));
        }
        if !self.exists.is_empty() {
            bool_query.insert("must".to_string(), json!({"bool": {"must": self.exists}}));
        }

        let mut body = Map::new();
        if !bool_query.is_empty() {
            body.insert("query".to_string(), json!({"bool": bool_query}));
        }
        if let Some(source) = &self.source {
            body.insert("_source".to_string(), source.clone());
        }
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), Value::Array(self.sort.clone()));
        }
        body.insert("from".to_string(), Value::from(self.from));
        body.insert("size".to_string(), Value::from(self.size));
        Value::Object(body)
    }
}

fn scalars(values: &[Scalar]) -> Vec<Value> {
    values.iter().map(Scalar::to_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_all() {
        let mut query = SearchQuery::new();
        query.window(0, 10000);
        assert_eq!(query.to_body(), json!({"from": 0, "size": 10000}));
        assert_eq!(query.clause_count(), 0);
    }

    #[test]
    fn clauses_land_in_their_sections() {
        let mut query = SearchQuery::new();
        query.terms("course_id", &[Scalar::Int(111), Scalar::Int(222)]);
        query.range("day", RangeOp::Gt, "2019-06-01");
        query.matches("real_name", "ann");
        query.not_term("grade", &Scalar::Int(2));
        query.exists("email");
        query.sort("grade", SortDirection::Desc);
        query.window(40, 20);

        assert_eq!(
            query.to_body(),
            json!({
                "query": {"bool": {
                    "filter": {"bool": {
                        "must": [
                            {"terms": {"course_id": [111, 222]}},
                            {"range": {"day": {"gt": "2019-06-01"}}},
                            {"match": {"real_name": "ann"}}
                        ],
                        "must_not": [{"term": {"grade": 2}}]
                    }},
                    "must": {"bool": {"must": [{"exists": {"field": "email"}}]}}
                }},
                "sort": [{"grade": {"order": "desc"}}],
                "from": 40,
                "size": 20
            })
        );
        assert_eq!(query.clause_count(), 5);
    }

    #[test]
    fn exists_only_has_no_filter_section() {
        let mut query = SearchQuery::new();
        query.exists("email");
        let body = query.to_body();
        assert!(body["query"]["bool"].get("filter").is_none());
        assert_eq!(
            body["query"]["bool"]["must"]["bool"]["must"],
            json!([{"exists": {"field": "email"}}])
        );
    }

    #[test]
    fn source_projection() {
        let mut query = SearchQuery::new();
        query.source(json!(["id", "real_name"]));
        assert_eq!(query.to_body()["_source"], json!(["id", "real_name"]));
    }
}
