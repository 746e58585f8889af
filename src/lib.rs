//! Food-Harvest: a budget-aware food catalog harvester
//!
//! This crate discovers brands, restaurants, and categories by paging a
//! rate-limited remote food search API with broad seed terms, then extracts
//! each discovered entity's item set into a resumable on-disk catalog.

pub mod catalog;
pub mod classify;
pub mod client;
pub mod config;
pub mod engine;
pub mod output;

use thiserror::Error;

/// Main error type for Food-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog store error: {0}")]
    Store(#[from] catalog::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid run phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: engine::RunPhase,
        to: engine::RunPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Result type alias for Food-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{normalize_key, Entity, EntityKind, FoodItem};
pub use client::RequestBudget;
pub use config::Config;
pub use engine::{run_harvest, Orchestrator, RunPhase, RunReport};
