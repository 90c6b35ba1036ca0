//! Shared request and result types
//!
//! Both backends accept the same sort/page directives and return the same
//! envelope, so callers never depend on which backend answered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::error::SearchError;
use crate::filters::FilterMap;

/// A single result record (JSON object for both backends)
pub type Record = serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(SearchError::invalid_filters(format!(
                "Invalid sort direction: {}. Use 'asc' or 'desc'",
                other
            ))),
        }
    }
}

/// Ordered sort directives; insertion order is the backend's sort order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<(String, SortDirection)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    /// Parse `field`, `field:asc` or `field:desc`
    pub fn parse_key(s: &str) -> Result<(String, SortDirection), SearchError> {
        let (field, direction) = match s.split_once(':') {
            Some((field, dir)) => (field, dir.parse()?),
            None => (s, SortDirection::Asc),
        };
        if field.is_empty() {
            return Err(SearchError::invalid_filters(
                "Invalid sort format. Use 'field' or 'field:asc' or 'field:desc'",
            ));
        }
        Ok((field.to_string(), direction))
    }

    /// Build from a JSON object, keeping key order
    pub fn from_json_object(
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, SearchError> {
        let mut spec = Self::new();
        for (field, direction) in object {
            let direction = direction.as_str().ok_or_else(|| {
                SearchError::invalid_filters(format!("Sort direction for {} must be a string", field))
            })?;
            spec = spec.then(field.clone(), direction.parse()?);
        }
        Ok(spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.keys.iter().map(|(field, dir)| (field.as_str(), *dir))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(String, SortDirection)> for SortSpec {
    fn from_iter<I: IntoIterator<Item = (String, SortDirection)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Page directive; zero page or size means unpaged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageSpec {
    pub page: u64,
    pub size: u64,
}

impl PageSpec {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    pub fn unpaged() -> Self {
        Self::default()
    }

    pub fn is_paged(&self) -> bool {
        self.page > 0 && self.size > 0
    }

    /// `(page - 1) * size` for paged requests
    pub fn offset(&self) -> Option<u64> {
        self.is_paged()
            .then(|| (self.page - 1).saturating_mul(self.size))
    }
}

/// Pagination metadata in the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub size: u64,
    pub page: u64,
    pub total_page: u64,
}

/// Uniform result shape returned by every backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub list: Vec<Record>,
    pub meta: PageMeta,
}

/// One search invocation
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub filters: FilterMap,
    pub page: PageSpec,
    pub sort: SortSpec,
    /// Relations to eagerly include (relational backend)
    pub include: Vec<String>,
    /// Reserved aggregation directive; accepted but not compiled
    pub aggs: Option<serde_json::Value>,
}

impl SearchRequest {
    pub fn new(filters: FilterMap) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u64, size: u64) -> Self {
        self.page = PageSpec::new(page, size);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn include<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = relations.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_for_paged_requests() {
        assert_eq!(PageSpec::new(3, 20).offset(), Some(40));
        assert_eq!(PageSpec::new(1, 20).offset(), Some(0));
        assert_eq!(PageSpec::new(0, 20).offset(), None);
        assert_eq!(PageSpec::new(3, 0).offset(), None);
        assert!(!PageSpec::unpaged().is_paged());
    }

    #[test]
    fn sort_key_parse() {
        assert_eq!(
            SortSpec::parse_key("created_at:desc").unwrap(),
            ("created_at".to_string(), SortDirection::Desc)
        );
        assert_eq!(
            SortSpec::parse_key("name").unwrap(),
            ("name".to_string(), SortDirection::Asc)
        );
        assert_eq!(
            SortSpec::parse_key("name:ASC").unwrap(),
            ("name".to_string(), SortDirection::Asc)
        );
        assert!(SortSpec::parse_key("name:sideways").is_err());
        assert!(SortSpec::parse_key(":asc").is_err());
    }

    #[test]
    fn sort_from_json_keeps_order() {
        let json = serde_json::json!({"grade": "desc", "id": "asc", "age": "desc"});
        let spec = SortSpec::from_json_object(json.as_object().unwrap()).unwrap();
        let keys: Vec<(&str, SortDirection)> = spec.iter().collect();
        assert_eq!(
            keys,
            vec![
                ("grade", SortDirection::Desc),
                ("id", SortDirection::Asc),
                ("age", SortDirection::Desc),
            ]
        );
    }

    #[test]
    fn envelope_serializes_list_and_meta() {
        let envelope = ResultEnvelope {
            list: vec![serde_json::json!({"id": 1})],
            meta: PageMeta {
                total: 1,
                size: 1,
                page: 1,
                total_page: 1,
            },
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "list": [{"id": 1}],
                "meta": {"total": 1, "size": 1, "page": 1, "total_page": 1}
            })
        );
    }
}
