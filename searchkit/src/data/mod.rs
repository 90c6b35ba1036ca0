//! Query backends and shared result types
//!
//! - `relational` - SQL backend over a [`relational::RelationalExecutor`]
//! - `search_engine` - boolean-query backend over a [`search_engine::SearchClient`]
//! - `sql` - SQL rendering and dialects
//! - `normalize` - raw results to the `{list, meta}` envelope
//! - `traits` - the [`QueryBackend`] capability trait
//! - `types` - sort, page and envelope types
//! - `error` - unified error type

pub mod error;
pub mod normalize;
pub mod relational;
pub mod search_engine;
pub mod sql;
pub mod traits;
pub mod types;

pub use error::SearchError;
pub use relational::{RelationalBackend, SqliteExecutor};
pub use search_engine::{HttpSearchClient, SearchEngineBackend};
pub use traits::QueryBackend;
pub use types::{PageMeta, PageSpec, Record, ResultEnvelope, SearchRequest, SortDirection, SortSpec};
