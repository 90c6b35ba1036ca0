//! Declarative filter-query compiler
//!
//! A resource declares which filter keys it accepts in a [`FilterSpec`]. A
//! [`SearchOrchestrator`] compiles an incoming filter map against that spec,
//! renders the predicates into a relational or search-engine query, applies
//! sort and pagination, executes, and returns the same `{list, meta}`
//! envelope for either backend.
//!
//! - `filters` - filter values, specs, range tokens and the predicate compiler
//! - `data` - backends, SQL rendering, result types and errors
//! - `domain` - the search orchestrator
//! - `core` - CLI, configuration and constants for the binary
//! - `utils` - small helpers

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod filters;
pub mod utils;

pub use app::App;
pub use data::{
    PageMeta, PageSpec, QueryBackend, ResultEnvelope, SearchError, SearchRequest, SortDirection,
    SortSpec,
};
pub use domain::SearchOrchestrator;
pub use filters::{FilterMap, FilterSpec, FilterValue, Predicate, Scalar};
