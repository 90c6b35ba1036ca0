//! Command-line application

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::cli::{self, SearchArgs};
use crate::core::config::{AppConfig, BackendKind, ResourceConfig};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::error::SearchError;
use crate::data::relational::{RelationalBackend, SqliteExecutor};
use crate::data::search_engine::{HttpSearchClient, SearchEngineBackend};
use crate::data::types::{ResultEnvelope, SearchRequest, SortSpec};
use crate::domain::SearchOrchestrator;
use crate::filters::{FilterMap, FilterSpec, parse_filter_map};

pub struct App;

impl App {
    /// Run one search from CLI arguments and print the envelope to stdout
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, args) = cli::parse();
        tracing::trace!(args = ?args, "Parsed search arguments");

        let config = AppConfig::load(&cli_config)?;
        let envelope = Self::execute(&config, &args).await?;

        let output =
            serde_json::to_string_pretty(&envelope).context("Failed to serialize search result")?;
        println!("{}", output);
        Ok(())
    }

    /// Logs go to stderr so stdout carries only the result
    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| default_log_filter());

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    pub async fn execute(config: &AppConfig, args: &SearchArgs) -> Result<ResultEnvelope> {
        let resource = config.resource(&args.resource)?;
        let spec = Arc::new(
            resource
                .filter_spec()
                .with_context(|| format!("Invalid filter declaration for '{}'", args.resource))?,
        );
        let request = Self::build_request(args)?;
        let backend = args.backend.unwrap_or_else(|| resource.default_backend());

        tracing::debug!(resource = %args.resource, backend = %backend, "Running search");
        match backend {
            BackendKind::Sqlite => Self::search_relational(config, resource, spec, &request).await,
            BackendKind::SearchEngine => Self::search_engine(config, resource, spec, &request).await,
        }
    }

    async fn search_relational(
        config: &AppConfig,
        resource: &ResourceConfig,
        spec: Arc<FilterSpec>,
        request: &SearchRequest,
    ) -> Result<ResultEnvelope> {
        let table = resource
            .table
            .as_deref()
            .context("Resource has no table for the sqlite backend")?;

        let mut executor =
            SqliteExecutor::connect(&config.relational.url, config.relational.max_connections)
                .await
                .with_context(|| format!("Failed to open {}", config.relational.url))?;
        for (name, def) in &resource.relations {
            executor = executor.with_relation(name.clone(), def.clone());
        }

        let orchestrator = SearchOrchestrator::new(spec, RelationalBackend::new(executor, table));
        orchestrator.search(request).await.map_err(search_failed)
    }

    async fn search_engine(
        config: &AppConfig,
        resource: &ResourceConfig,
        spec: Arc<FilterSpec>,
        request: &SearchRequest,
    ) -> Result<ResultEnvelope> {
        let index = resource
            .index
            .as_deref()
            .context("Resource has no index for the search-engine backend")?;

        let search = &config.search_engine;
        let mut client =
            HttpSearchClient::new(search.url.clone(), Duration::from_secs(search.timeout_secs))?;
        if let Some(username) = &search.username {
            client = client.with_basic_auth(username.clone(), search.password.clone());
        }

        let mut backend =
            SearchEngineBackend::new(client, index).with_max_window(search.max_result_window);
        if let Some(doc_type) = &resource.doc_type {
            backend = backend.with_doc_type(doc_type.clone());
        }

        let orchestrator = SearchOrchestrator::new(spec, backend);
        orchestrator.search(request).await.map_err(search_failed)
    }

    fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
        let filters = match &args.filters {
            Some(json) => parse_filter_map(json)?,
            None => FilterMap::new(),
        };
        let sort = args
            .sort
            .iter()
            .map(|key| SortSpec::parse_key(key))
            .collect::<Result<SortSpec, _>>()?;
        Ok(SearchRequest::new(filters)
            .page(args.page, args.size)
            .sort(sort)
            .include(args.include.iter().cloned()))
    }
}

fn default_log_filter() -> String {
    format!("info,{}=info", APP_NAME_LOWER)
}

/// Request problems are reported with their user-facing text
fn search_failed(err: SearchError) -> anyhow::Error {
    if err.is_client_error() {
        return anyhow::anyhow!(err.user_message());
    }
    let backend = err.backend();
    anyhow::Error::new(err).context(format!("Search against {} failed", backend))
}
