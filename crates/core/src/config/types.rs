use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::remote::TmdbConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

// =============================================================================
// Catalog
// =============================================================================

/// Remote movie catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// API root (e.g., "https://api.themoviedb.org/3")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    pub api_token: String,
    /// Prefix for poster paths
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl CatalogConfig {
    /// Client settings for [`TmdbClient`](crate::remote::TmdbClient).
    pub fn client_config(&self) -> TmdbConfig {
        TmdbConfig {
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
            language: self.language.clone(),
            timeout: Duration::from_secs(u64::from(self.timeout_secs)),
        }
    }
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w200".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout() -> u32 {
    30
}

// =============================================================================
// Database
// =============================================================================

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("moviebrowser.db")
}

// =============================================================================
// Search
// =============================================================================

/// Search pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Quiet period after the last edit before searching
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Shorter queries never reach the network
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    /// Rows from the end that trigger loading the next page
    #[serde(default = "default_prefetch_window")]
    pub prefetch_window: usize,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            prefetch_window: default_prefetch_window(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_min_query_chars() -> usize {
    3
}

fn default_prefetch_window() -> usize {
    4
}

// =============================================================================
// Sanitized
// =============================================================================

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub catalog: SanitizedCatalogConfig,
    pub database: DatabaseConfig,
    pub search: SearchConfig,
}

/// Sanitized catalog config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub api_token_configured: bool,
    pub image_base_url: String,
    pub language: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                api_token_configured: !config.catalog.api_token.trim().is_empty(),
                image_base_url: config.catalog.image_base_url.clone(),
                language: config.catalog.language.clone(),
                timeout_secs: config.catalog.timeout_secs,
            },
            database: config.database.clone(),
            search: config.search.clone(),
        }
    }
}
