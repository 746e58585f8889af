//! Food-Harvest main entry point
//!
//! This is the command-line interface for the Food-Harvest catalog harvester.

use clap::Parser;
use food_harvest::client::{RequestBudget, SearchClient, SearchSource};
use food_harvest::config::{load_config_with_hash, Config};
use food_harvest::run_harvest;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Food-Harvest: a budget-aware food catalog harvester
///
/// Food-Harvest pages a signed food search API with broad seed terms to
/// discover brands, restaurants, and categories, then extracts each one's
/// items into a resumable JSON catalog.
#[derive(Parser, Debug)]
#[command(name = "food-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A budget-aware food catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the existing catalog and re-extract every entity
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be harvested without calling the API
    #[arg(long, conflicts_with_all = ["stats", "brand_catalog", "fresh"])]
    dry_run: bool,

    /// Show statistics from the catalog directory and exit
    #[arg(long, conflicts_with_all = ["dry_run", "brand_catalog", "fresh"])]
    stats: bool,

    /// Fetch the remote brand catalog, summarize it, and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "fresh"])]
    brand_catalog: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Credentials may come from a .env file
    dotenvy::dotenv().ok();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.brand_catalog {
        handle_brand_catalog(&config).await?;
    } else {
        handle_run(config, config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("food_harvest=info,warn"),
            1 => EnvFilter::new("food_harvest=debug,info"),
            2 => EnvFilter::new("food_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Food-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  Page size: {}", config.api.page_size);
    println!("  Consumer key: {}", mask(config.api.key()));

    println!("\nClient:");
    println!("  Minimum delay: {}ms", config.client.min_delay_ms);
    println!(
        "  Retries: {} (delay {}ms)",
        config.client.retry_attempts, config.client.retry_delay_ms
    );
    println!("  Request timeout: {}ms", config.client.request_timeout_ms);
    println!("  User agent: {}", config.client.user_agent);

    println!("\nBudget:");
    println!("  Ceiling: {}", config.budget.ceiling);
    println!("  Safety margin: {}", config.budget.safety_margin);

    println!("\nExtraction:");
    println!(
        "  Brands: up to {} ({} pages each)",
        config.extraction.max_brands, config.extraction.brand_max_pages
    );
    println!(
        "  Restaurants: up to {} ({} pages each)",
        config.extraction.max_restaurants, config.extraction.restaurant_max_pages
    );
    println!("  Categories: up to {}", config.extraction.max_categories);
    println!("  Patience: {} pages", config.extraction.patience);

    println!("\nOutput:");
    println!("  Catalog: {}", config.output.catalog_dir);
    println!("  Source label: {}", config.output.source_label);

    println!(
        "\nSeed Terms ({}, up to {} pages each):",
        config.discovery.seed_terms.len(),
        config.discovery.max_pages_per_term
    );
    for term in &config.discovery.seed_terms {
        println!("  - {}", term);
    }
    if config.discovery.use_brand_catalog {
        println!("  + remote brand catalog");
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Shows the first and last characters of a credential
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Handles the --stats mode: shows statistics from the catalog directory
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use food_harvest::catalog::{CatalogStore, FsCatalogStore};
    use food_harvest::output::print_statistics;

    println!("Catalog: {}\n", config.output.catalog_dir);

    let store = FsCatalogStore::from_config(&config.output);
    let stats = store.statistics()?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the --brand-catalog mode: fetches and summarizes the remote brand list
async fn handle_brand_catalog(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let budget = Arc::new(RequestBudget::from_config(&config.budget));
    let client = SearchClient::from_config(config, budget)?;

    tracing::info!("Fetching remote brand catalog...");
    let catalog = match client.brand_catalog().await {
        Some(catalog) => catalog,
        None => {
            tracing::error!("Brand catalog request returned no data");
            return Err("brand catalog unavailable".into());
        }
    };

    println!("=== Remote Brand Catalog ===\n");
    println!("Shape: {}", catalog.shape());
    println!("Brands: {}", catalog.names().len());
    for name in catalog.names().iter().take(20) {
        println!("  - {}", name);
    }
    if catalog.names().len() > 20 {
        println!("  ... and {} more", catalog.names().len() - 20);
    }

    Ok(())
}

/// Handles the main harvest run
async fn handle_run(
    config: Config,
    config_hash: String,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use food_harvest::output::print_run_report;

    if fresh {
        tracing::info!("Starting fresh run (ignoring existing catalog)");
    } else {
        tracing::info!("Starting run (entities already in the catalog are skipped)");
    }

    tracing::info!(
        "Seed terms: {}, request ceiling: {} (margin {})",
        config.discovery.seed_terms.len(),
        config.budget.ceiling,
        config.budget.safety_margin
    );

    match run_harvest(config, config_hash, fresh).await {
        Ok(report) => {
            print_run_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
