//! Search pipeline
//!
//! - `search` - the orchestrator sequencing compile, render, execute and normalize

pub mod search;

pub use search::SearchOrchestrator;
