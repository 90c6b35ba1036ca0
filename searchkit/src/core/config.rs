use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::error::SearchError;
use crate::data::relational::RelationDef;
use crate::filters::FilterSpec;
use crate::utils::file::expand_home;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_MAX_RESULT_WINDOW, DEFAULT_SEARCH_TIMEOUT_SECS,
    DEFAULT_SEARCH_URL, DEFAULT_SQLITE_URL, SQLITE_MAX_CONNECTIONS,
};

// =============================================================================
// Backend Kind
// =============================================================================

/// Which backend a search runs against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Sqlite,
    SearchEngine,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::SearchEngine => write!(f, "search-engine"),
        }
    }
}

// =============================================================================
// File Config Structures
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RelationalFileConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchEngineFileConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_result_window: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// One searchable resource: where it lives and which filter keys it accepts
///
/// Special (handler-dispatched) keys need code; declaring one here fails
/// validation because no handler can be registered from a file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ResourceConfig {
    pub table: Option<String>,
    pub index: Option<String>,
    pub doc_type: Option<String>,
    #[serde(default)]
    pub normal: Vec<String>,
    #[serde(default)]
    pub not: Vec<String>,
    #[serde(default)]
    pub range: Vec<String>,
    #[serde(default)]
    pub contain: Vec<String>,
    #[serde(default)]
    pub special: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationDef>,
}

impl ResourceConfig {
    pub fn filter_spec(&self) -> Result<FilterSpec, SearchError> {
        FilterSpec::builder()
            .normal(self.normal.iter().cloned())
            .not(self.not.iter().cloned())
            .range(self.range.iter().cloned())
            .contain(self.contain.iter().cloned())
            .special(self.special.iter().cloned())
            .includes(self.includes.iter().cloned())
            .build()
    }

    /// Relational when a table is set, otherwise the search engine
    pub fn default_backend(&self) -> BackendKind {
        if self.table.is_none() && self.index.is_some() {
            BackendKind::SearchEngine
        } else {
            BackendKind::Sqlite
        }
    }
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub relational: Option<RelationalFileConfig>,
    pub search_engine: Option<SearchEngineFileConfig>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    ///
    /// Resources are replaced whole, by name.
    fn merge(&mut self, other: FileConfig) {
        if let Some(relational) = other.relational {
            let current = self
                .relational
                .get_or_insert_with(RelationalFileConfig::default);
            if relational.url.is_some() {
                current.url = relational.url;
            }
            if relational.max_connections.is_some() {
                current.max_connections = relational.max_connections;
            }
        }

        if let Some(search) = other.search_engine {
            let current = self
                .search_engine
                .get_or_insert_with(SearchEngineFileConfig::default);
            if search.url.is_some() {
                current.url = search.url;
            }
            if search.username.is_some() {
                current.username = search.username;
            }
            if search.password.is_some() {
                current.password = search.password;
            }
            if search.max_result_window.is_some() {
                current.max_result_window = search.max_result_window;
            }
            if search.timeout_secs.is_some() {
                current.timeout_secs = search.timeout_secs;
            }
        }

        for (name, resource) in other.resources {
            tracing::trace!(resource = %name, "Merging resource");
            self.resources.insert(name, resource);
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct RelationalConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SearchEngineConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_result_window: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub relational: RelationalConfig,
    pub search_engine: SearchEngineConfig,
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl AppConfig {
    /// Load configuration with priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.searchkit/searchkit.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_home(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_sources(cli, file_config);
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults -> file config -> CLI/env overrides
    fn from_sources(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_relational = file_config.relational.unwrap_or_default();
        let file_search = file_config.search_engine.unwrap_or_default();

        let relational = RelationalConfig {
            url: cli
                .sqlite_url
                .clone()
                .or(file_relational.url)
                .unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string()),
            max_connections: file_relational
                .max_connections
                .unwrap_or(SQLITE_MAX_CONNECTIONS),
        };

        let search_engine = SearchEngineConfig {
            url: cli
                .search_url
                .clone()
                .or(file_search.url)
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            username: cli.search_username.clone().or(file_search.username),
            password: cli.search_password.clone().or(file_search.password),
            max_result_window: cli
                .max_result_window
                .or(file_search.max_result_window)
                .unwrap_or(DEFAULT_MAX_RESULT_WINDOW),
            timeout_secs: file_search
                .timeout_secs
                .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
        };

        Self {
            relational,
            search_engine,
            resources: file_config.resources,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.relational.max_connections == 0 {
            anyhow::bail!("Configuration error: relational.max_connections must be at least 1");
        }
        if self.search_engine.max_result_window == 0 {
            anyhow::bail!("Configuration error: search_engine.max_result_window must be at least 1");
        }
        if !self.search_engine.url.starts_with("http://")
            && !self.search_engine.url.starts_with("https://")
        {
            anyhow::bail!(
                "Configuration error: search_engine.url must start with http:// or https://. Got: {}",
                self.search_engine.url
            );
        }

        for (name, resource) in &self.resources {
            if resource.table.is_none() && resource.index.is_none() {
                anyhow::bail!(
                    "Configuration error: resources.{} needs a table or an index",
                    name
                );
            }
            resource
                .filter_spec()
                .with_context(|| format!("Configuration error in resources.{}", name))?;
            if let Some(missing) = resource
                .includes
                .iter()
                .find(|rel| resource.table.is_some() && !resource.relations.contains_key(*rel))
            {
                anyhow::bail!(
                    "Configuration error: resources.{} includes '{}' but declares no relation for it",
                    name,
                    missing
                );
            }
        }
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Result<&ResourceConfig> {
        self.resources.get(name).with_context(|| {
            let known: Vec<&str> = self.resources.keys().map(|k| k.as_str()).collect();
            format!(
                "Unknown resource '{}'. Configured resources: {}",
                name,
                if known.is_empty() {
                    "(none)".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }
}

/// Get the profile config path (~/.searchkit/searchkit.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
