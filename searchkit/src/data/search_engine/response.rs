//! Search-engine reply shape
//!
//! Only the parts the normalizer reads are modelled; everything else in the
//! reply is ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
    #[serde(default)]
    pub total: HitsTotal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// `hits.total` is a bare number on older engines and `{value, relation}` on newer ones
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HitsTotal {
    Count(u64),
    Tracked {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl Default for HitsTotal {
    fn default() -> Self {
        HitsTotal::Count(0)
    }
}

impl HitsTotal {
    pub fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(n) => *n,
            HitsTotal::Tracked { value, .. } => *value,
        }
    }
}

impl SearchResponse {
    /// Hit sources in reply order
    pub fn into_sources(self) -> (Vec<Value>, u64) {
        let total = self.hits.total.value();
        let list = self.hits.hits.into_iter().map(|hit| hit.source).collect();
        (list, total)
    }
}
