use crate::config::types::{CatalogConfig, Config, HttpConfig, OutputConfig, RelationalConfig};
use crate::extract::{ExtractionRuleSet, ListingSelectors};
use crate::url::{listing_url, OFFSET_PLACEHOLDER};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};
use url::Url;

/// Largest accepted worker count
const MAX_WORKERS: u32 = 8;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_http_config(&config.http)?;
    ListingSelectors::from_config(&config.listing)?;
    ExtractionRuleSet::from_config(&config.fields)?;
    validate_output_config(&config.output)?;
    if let Some(relational) = &config.relational {
        validate_relational_config(relational)?;
    }
    Ok(())
}

/// Validates the catalog section
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.source.is_empty() {
        return Err(ConfigError::Validation("source cannot be empty".to_string()));
    }

    if !config
        .source
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "source must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.source
        )));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.start_offset % config.page_size != 0 {
        return Err(ConfigError::Validation(format!(
            "start_offset must be a multiple of page_size ({}), got {}",
            config.page_size, config.start_offset
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.listing_url.contains(OFFSET_PLACEHOLDER) {
        return Err(ConfigError::InvalidUrl(format!(
            "listing_url must contain {}: '{}'",
            OFFSET_PLACEHOLDER, config.listing_url
        )));
    }

    let first = listing_url(&config.listing_url, config.start_offset, config.page_size);
    let url = Url::parse(&first)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url '{}': {}", first, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "listing_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates the HTTP section
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    let mut has_user_agent = false;
    for (name, value) in &config.headers {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;

        if header == USER_AGENT && !value.trim().is_empty() {
            has_user_agent = true;
        }
    }

    if !has_user_agent {
        return Err(ConfigError::Validation(
            "http.headers must set a non-empty user-agent".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dir.is_empty() {
        return Err(ConfigError::Validation(
            "output dir cannot be empty".to_string(),
        ));
    }

    if matches!(&config.images_dir, Some(dir) if dir.is_empty()) {
        return Err(ConfigError::Validation(
            "images_dir cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates relational sink configuration
fn validate_relational_config(config: &RelationalConfig) -> Result<(), ConfigError> {
    validate_identifier(&config.table)?;

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Table names are interpolated into SQL, so only plain identifiers pass
pub(crate) fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "table must be a plain SQL identifier, got '{}'",
            name
        )));
    }

    Ok(())
}
