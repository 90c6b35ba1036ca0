// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "searchkit";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".searchkit";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "searchkit.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SEARCHKIT_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SEARCHKIT_LOG";

// =============================================================================
// Environment Variables - Backends
// =============================================================================

/// Environment variable for the relational store URL
pub const ENV_SQLITE_URL: &str = "SEARCHKIT_SQLITE_URL";

/// Environment variable for the search engine base URL
pub const ENV_SEARCH_URL: &str = "SEARCHKIT_SEARCH_URL";

/// Environment variable for the search engine username
pub const ENV_SEARCH_USERNAME: &str = "SEARCHKIT_SEARCH_USERNAME";

/// Environment variable for the search engine password
pub const ENV_SEARCH_PASSWORD: &str = "SEARCHKIT_SEARCH_PASSWORD";

// =============================================================================
// Relational Defaults
// =============================================================================

/// Default relational store URL
pub const DEFAULT_SQLITE_URL: &str = "sqlite://searchkit.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Search Engine Defaults
// =============================================================================

/// Default search engine base URL
pub const DEFAULT_SEARCH_URL: &str = "http://127.0.0.1:9200";

/// Deepest offset the search engine will page to (index.max_result_window)
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Search request timeout in seconds
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
