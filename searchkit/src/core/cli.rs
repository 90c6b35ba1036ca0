use clap::Parser;

use std::path::PathBuf;

use super::config::BackendKind;
use super::constants::{
    ENV_CONFIG, ENV_SEARCH_PASSWORD, ENV_SEARCH_URL, ENV_SEARCH_USERNAME, ENV_SQLITE_URL,
};

#[derive(Parser)]
#[command(name = "searchkit")]
#[command(version, about = "Run declarative filter queries against a relational store or search engine", long_about = None)]
pub struct Cli {
    /// Resource name declared under `resources` in the config file
    pub resource: String,

    /// Backend to query (sqlite or search-engine); inferred from the resource when omitted
    #[arg(long, short = 'b', value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Filter map as a JSON object
    #[arg(long, short = 'f')]
    pub filters: Option<String>,

    /// Page number (0 = unpaged)
    #[arg(long, default_value_t = 0)]
    pub page: u64,

    /// Page size (0 = unpaged)
    #[arg(long, default_value_t = 0)]
    pub size: u64,

    /// Sort key as field or field:asc|desc; repeat for secondary keys
    #[arg(long = "sort", value_name = "FIELD[:DIR]")]
    pub sort: Vec<String>,

    /// Relation to include; repeat for more
    #[arg(long = "include", value_name = "RELATION")]
    pub include: Vec<String>,

    /// Path to config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite connection URL
    #[arg(long, env = ENV_SQLITE_URL)]
    pub sqlite_url: Option<String>,

    /// Search engine base URL
    #[arg(long, env = ENV_SEARCH_URL)]
    pub search_url: Option<String>,

    /// Search engine username (basic auth)
    #[arg(long, env = ENV_SEARCH_USERNAME)]
    pub search_username: Option<String>,

    /// Search engine password (basic auth)
    #[arg(long, env = ENV_SEARCH_PASSWORD, hide_env_values = true)]
    pub search_password: Option<String>,

    /// Deepest offset the search engine accepts
    #[arg(long)]
    pub max_result_window: Option<u64>,
}

/// Parse backend kind from CLI string
fn parse_backend(s: &str) -> Result<BackendKind, String> {
    match s.to_lowercase().as_str() {
        "sqlite" | "relational" => Ok(BackendKind::Sqlite),
        "search-engine" | "search_engine" | "elasticsearch" | "es" => Ok(BackendKind::SearchEngine),
        _ => Err(format!(
            "Invalid backend '{}'. Valid options: sqlite, search-engine",
            s
        )),
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub sqlite_url: Option<String>,
    pub search_url: Option<String>,
    pub search_username: Option<String>,
    pub search_password: Option<String>,
    pub max_result_window: Option<u64>,
}

/// The search to run, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub resource: String,
    pub backend: Option<BackendKind>,
    pub filters: Option<String>,
    pub page: u64,
    pub size: u64,
    pub sort: Vec<String>,
    pub include: Vec<String>,
}

impl Cli {
    /// Split into config overrides and the search to run
    pub fn split(self) -> (CliConfig, SearchArgs) {
        let config = CliConfig {
            config: self.config,
            sqlite_url: self.sqlite_url,
            search_url: self.search_url,
            search_username: self.search_username,
            search_password: self.search_password,
            max_result_window: self.max_result_window,
        };
        let args = SearchArgs {
            resource: self.resource,
            backend: self.backend,
            filters: self.filters,
            page: self.page,
            size: self.size,
            sort: self.sort,
            include: self.include,
        };
        (config, args)
    }
}

/// Parse CLI arguments into config overrides and the search to run
pub fn parse() -> (CliConfig, SearchArgs) {
    Cli::parse().split()
}
