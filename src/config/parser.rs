use crate::config::types::{ApiConfig, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Credentials missing from the file are resolved from the environment
/// variables named in the `[api]` section before validation runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, resolve, or validate
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use food_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Catalog directory: {}", config.output.catalog_dir);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration text, resolves credentials, and validates the result
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;

    resolve_credentials(&mut config.api)?;

    validate(&config)?;

    Ok(config)
}

/// Fills absent credentials from the environment
fn resolve_credentials(api: &mut ApiConfig) -> Result<(), ConfigError> {
    if api.consumer_key.is_none() {
        let key = std::env::var(&api.consumer_key_env)
            .map_err(|_| ConfigError::MissingCredential(api.consumer_key_env.clone()))?;
        api.consumer_key = Some(key);
    }

    if api.consumer_secret.is_none() {
        let secret = std::env::var(&api.consumer_secret_env)
            .map_err(|_| ConfigError::MissingCredential(api.consumer_secret_env.clone()))?;
        api.consumer_secret = Some(secret);
    }

    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is recorded in the discovery log so runs can be tied to the
/// configuration that produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
