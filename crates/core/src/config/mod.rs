mod types;
mod validate;

pub use types::*;
pub use validate::validate_config;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use thiserror::Error;

/// Prefix of environment overrides. Nested keys are separated by `__`,
/// e.g. `MOVIEBROWSER_CATALOG__API_TOKEN`.
const ENV_PREFIX: &str = "MOVIEBROWSER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Read `path`, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a TOML document without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str("[catalog]\napi_token = \"abc\"\n").unwrap();

        assert_eq!(config.catalog.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.catalog.image_base_url, "https://image.tmdb.org/t/p/w200");
        assert_eq!(config.catalog.language, "en-US");
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.database.path.to_str(), Some("moviebrowser.db"));
        assert_eq!(config.search, SearchConfig::default());
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_token_is_required() {
        let toml = "[catalog]\nbase_url = \"https://example.com/3\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn test_search_section_overrides() {
        let toml = r#"
[catalog]
api_token = "abc"

[search]
debounce_ms = 150
prefetch_window = 10
"#;
        let search = load_config_from_str(toml).unwrap().search;
        assert_eq!(search.debounce_ms, 150);
        assert_eq!(search.prefetch_window, 10);
        assert_eq!(search.min_query_chars, 3);
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("moviebrowser.toml");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::FileNotFound(_))
        ));

        std::fs::write(
            &path,
            "[catalog]\napi_token = \"file-token\"\ntimeout_secs = 5\n\n[database]\npath = \"/tmp/movies.db\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.catalog.timeout_secs, 5);
        assert_eq!(config.database.path.to_str(), Some("/tmp/movies.db"));
    }
}
