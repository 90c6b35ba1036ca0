//! Unified error type for the search layer
//!
//! Covers filter-spec construction, request compilation, pagination limits
//! and the errors surfaced by both execution backends. Backend failures are
//! wrapped without modification so callers see the original cause.

use thiserror::Error;

use crate::filters::FilterCategory;

/// Message shown to end users when a page lies beyond the search window
pub const PAGE_TOO_LARGE_MESSAGE: &str = "The selected page number is too large and is not supported";

#[derive(Error, Debug)]
pub enum SearchError {
    /// A special field was declared without a registered handler
    #[error("No handler registered for special filter: {field}")]
    HandlerNotFound { field: String },

    /// A filter key was declared in more than one category
    #[error("Filter field {field} is declared as both {first} and {second}")]
    DuplicateField {
        field: String,
        first: FilterCategory,
        second: FilterCategory,
    },

    /// Requested offset lies beyond the search engine's result window
    #[error("Page {page} (size {size}) starts at offset {from}, beyond the result window of {max_window}")]
    PageTooLarge {
        page: u64,
        size: u64,
        from: u64,
        max_window: u64,
    },

    /// Malformed filter input
    #[error("Invalid filters: {0}")]
    InvalidFilters(String),

    /// Relational store error
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Transport error talking to the search engine
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Search engine replied with a non-success status
    #[error("{backend} returned {status}: {message}")]
    Backend {
        backend: &'static str,
        status: u16,
        message: String,
    },

    /// Include passed the whitelist but the executor cannot load it
    #[error("Relation {0} is not configured on the executor")]
    UnknownRelation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchError {
    pub fn handler_not_found(field: impl Into<String>) -> Self {
        Self::HandlerNotFound {
            field: field.into(),
        }
    }

    pub fn invalid_filters(message: impl Into<String>) -> Self {
        Self::InvalidFilters(message.into())
    }

    /// Errors caused by the request itself rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::PageTooLarge { .. } | Self::InvalidFilters(_))
    }

    /// Text suitable for returning to the end user
    pub fn user_message(&self) -> String {
        match self {
            Self::PageTooLarge { .. } => PAGE_TOO_LARGE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sql(_) | Self::UnknownRelation(_) => "relational",
            Self::Http(_) | Self::PageTooLarge { .. } => "search_engine",
            Self::Backend { backend, .. } => *backend,
            Self::HandlerNotFound { .. }
            | Self::DuplicateField { .. }
            | Self::InvalidFilters(_)
            | Self::Config(_) => "unknown",
        }
    }
}
