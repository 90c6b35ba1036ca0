//! Filter values and JSON filter-map parsing

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::error::SearchError;

/// Maximum size of filter JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of keys in a filter map
const MAX_FILTER_KEYS: usize = 100;

/// Incoming filter directives keyed by (possibly prefixed) field name
pub type FilterMap = HashMap<String, FilterValue>;

/// A single filter value
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Value side of a filter map entry: null, a scalar, or an ordered list
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FilterValue {
    /// Null, empty string and empty list carry no filter.
    ///
    /// Zero and `false` are real values and are not blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(Scalar::Text(s)) => s.is_empty(),
            Self::Scalar(_) => false,
            Self::List(values) => values.is_empty(),
        }
    }

    /// View the value as a list; a scalar becomes a one-element slice
    pub fn as_slice(&self) -> &[Scalar] {
        match self {
            Self::Null => &[],
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::List(values) => values,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Scalar(s) => s.to_json(),
            Self::List(values) => values.iter().map(Scalar::to_json).collect(),
        }
    }

    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::from(s))
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        Self::Scalar(Scalar::Int(i))
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

/// Look up a key, treating blank values as absent
pub fn present<'a>(filters: &'a FilterMap, key: &str) -> Option<&'a FilterValue> {
    filters.get(key).filter(|v| !v.is_blank())
}

/// Parse a filter map from a JSON object
///
/// Validates size and key count before accepting the map.
pub fn parse_filter_map(json_str: &str) -> Result<FilterMap, SearchError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(SearchError::invalid_filters(format!(
            "Filter JSON exceeds maximum size of {} bytes",
            MAX_FILTER_JSON_SIZE
        )));
    }

    let filters: FilterMap = serde_json::from_str(json_str)
        .map_err(|e| SearchError::invalid_filters(e.to_string()))?;

    if filters.len() > MAX_FILTER_KEYS {
        return Err(SearchError::invalid_filters(format!(
            "Maximum {} filter keys allowed",
            MAX_FILTER_KEYS
        )));
    }

    Ok(filters)
}
