//! Application infrastructure: CLI, configuration and constants

pub mod cli;
pub mod config;
pub mod constants;

pub use cli::{CliConfig, SearchArgs};
pub use config::{AppConfig, BackendKind, ResourceConfig};
