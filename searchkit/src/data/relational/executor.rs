//! Execution contract for relational stores

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data::error::SearchError;
use crate::data::sql::{SqlDialect, SqlQuery};
use crate::data::types::Record;

/// Length-aware page of records, as a store's paginator reports it
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator {
    pub data: Vec<Record>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

impl Paginator {
    /// `last_page` is never below 1, even for an empty result
    pub fn new(data: Vec<Record>, total: u64, per_page: u64, current_page: u64) -> Self {
        let last_page = if per_page == 0 {
            1
        } else {
            total.div_ceil(per_page).max(1)
        };
        Self {
            data,
            total,
            per_page,
            current_page,
            last_page,
        }
    }
}

/// Raw relational result
#[derive(Debug, Clone, PartialEq)]
pub enum RelationalRaw {
    Paginated(Paginator),
    All(Vec<Record>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Attach every related row as an array
    #[default]
    HasMany,
    /// Attach the single related row, or null
    BelongsTo,
}

/// How to eager-load one relation
///
/// Related rows are those whose `related_key` equals the parent row's `parent_key`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationDef {
    pub table: String,
    pub parent_key: String,
    pub related_key: String,
    #[serde(default)]
    pub kind: RelationKind,
}

impl RelationDef {
    pub fn has_many(
        table: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            parent_key: parent_key.into(),
            related_key: related_key.into(),
            kind: RelationKind::HasMany,
        }
    }

    pub fn belongs_to(
        table: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            parent_key: parent_key.into(),
            related_key: related_key.into(),
            kind: RelationKind::BelongsTo,
        }
    }
}

/// Store that runs rendered relational queries
///
/// Errors from the store are returned unchanged; no retry happens here.
#[async_trait]
pub trait RelationalExecutor: Send + Sync {
    fn dialect(&self) -> &'static dyn SqlDialect;

    /// Run the windowed query plus a count over the same conditions
    async fn paginate(&self, query: &SqlQuery) -> Result<Paginator, SearchError>;

    /// Run the query without a page window
    async fn get(&self, query: &SqlQuery) -> Result<Vec<Record>, SearchError>;
}
