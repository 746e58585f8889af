use crate::config::types::{
    ApiConfig, BudgetConfig, ClientConfig, Config, DiscoveryConfig, ExtractionConfig, OutputConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest page the remote search accepts
const MAX_PAGE_SIZE: u32 = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_client_config(&config.client)?;
    validate_budget_config(&config.budget)?;
    validate_discovery_config(&config.discovery)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates endpoint, credentials, and page size
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidEndpoint(format!(
            "endpoint must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.key().is_empty() {
        return Err(ConfigError::Validation(
            "consumer key cannot be empty".to_string(),
        ));
    }

    if config.secret().is_empty() {
        return Err(ConfigError::Validation(
            "consumer secret cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    Ok(())
}

/// Validates retry and timeout settings
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry_attempts must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_budget_config(config: &BudgetConfig) -> Result<(), ConfigError> {
    if config.ceiling < 1 {
        return Err(ConfigError::Validation(
            "budget ceiling must be >= 1".to_string(),
        ));
    }

    if config.safety_margin >= config.ceiling {
        return Err(ConfigError::Validation(format!(
            "safety_margin ({}) must be smaller than the ceiling ({})",
            config.safety_margin, config.ceiling
        )));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_pages_per_term < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_term must be >= 1".to_string(),
        ));
    }

    if config.seed_terms.is_empty() {
        return Err(ConfigError::Validation(
            "seed_terms cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config.seed_terms.iter().position(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "seed term at index {} is blank",
            blank
        )));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.brand_max_pages < 1 || config.restaurant_max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "extraction page caps must be >= 1, got brand={} restaurant={}",
            config.brand_max_pages, config.restaurant_max_pages
        )));
    }

    if config.patience < 1 {
        return Err(ConfigError::Validation(
            "patience must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.catalog_dir.is_empty() {
        return Err(ConfigError::Validation(
            "catalog_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
