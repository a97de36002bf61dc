use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog URL is http(s)
/// - Catalog token is not blank
/// - Timeout is not 0
/// - Minimum query length is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let catalog = &config.catalog;

    if !(catalog.base_url.starts_with("http://") || catalog.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "catalog.base_url must be an http(s) URL, got '{}'",
            catalog.base_url
        )));
    }

    if catalog.api_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_token cannot be empty".to_string(),
        ));
    }

    if catalog.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.min_query_chars == 0 {
        return Err(ConfigError::ValidationError(
            "search.min_query_chars must be at least 1".to_string(),
        ));
    }

    Ok(())
}
