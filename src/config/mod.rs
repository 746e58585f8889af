//! Configuration module for Food-Harvest
//!
//! This module handles loading, parsing, credential resolution, and validation
//! of TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use food_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Request ceiling: {}", config.budget.ceiling);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, BudgetConfig, ClientConfig, Config, DiscoveryConfig, ExtractionConfig,
    OutputConfig, DEFAULT_SEED_TERMS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
