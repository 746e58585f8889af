//! Run orchestrator - main harvest sequencing logic
//!
//! This module drives one run through its phases:
//! - Verifying credentials with a canary search
//! - Loading prior catalog state
//! - Discovering entity names from the seed terms
//! - Extracting brands, restaurants, and categories in turn
//! - Writing the aggregate discovery file and run log
//!
//! The request budget is shared across every phase. Once it crosses its
//! safety margin the current extraction phase ends and the run moves straight
//! to persistence.

use crate::catalog::{
    format_timestamp, normalize_key, AggregateReport, CatalogStore, DiscoveryCounts,
    DiscoveryLog, EntityKind, ExistingState, ExtractionOutcome, ExtractionResults,
    FsCatalogStore,
};
use crate::client::{BrandCatalog, RequestBudget, SearchClient, SearchSource};
use crate::config::Config;
use crate::engine::discovery::{discover, Discovery, DiscoverySettings};
use crate::engine::extraction::{extract, ExtractionPolicy};
use crate::engine::phase::RunPhase;
use crate::{HarvestError, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Entities between progress log lines
const PROGRESS_INTERVAL: usize = 20;

/// Discovery method recorded in the aggregate file
const AGGREGATE_METHOD: &str = "Comprehensive seed-term discovery";

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Phase the run ended in
    pub phase: RunPhase,

    pub discovered: DiscoveryCounts,

    /// Discovered foods whose ids were not in the catalog before the run
    pub new_foods: usize,

    pub extraction_results: ExtractionResults,
    pub outcomes: Vec<ExtractionOutcome>,

    /// Entity files written this run
    pub files_written: usize,

    pub requests_used: u64,
    pub request_ceiling: u64,

    /// True if a phase ended because the budget crossed its margin
    pub terminated_early: bool,
}

impl RunReport {
    /// Total items written across all entity files this run
    pub fn items_extracted(&self) -> usize {
        EntityKind::all()
            .iter()
            .map(|kind| self.extraction_results.total(*kind))
            .sum()
    }
}

/// Main harvest orchestrator
pub struct Orchestrator<S, C> {
    config: Config,
    config_hash: String,
    source: S,
    store: C,
    budget: Arc<RequestBudget>,
    fresh: bool,
    phase: RunPhase,
}

impl<S: SearchSource, C: CatalogStore> Orchestrator<S, C> {
    /// Creates a new orchestrator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `config_hash` - Hash of the configuration file, recorded in the run log
    /// * `source` - The search source (charges `budget` for every request)
    /// * `store` - The catalog store
    /// * `budget` - The request budget shared with `source`
    /// * `fresh` - Ignore prior catalog state and re-extract everything
    pub fn new(
        config: Config,
        config_hash: String,
        source: S,
        store: C,
        budget: Arc<RequestBudget>,
        fresh: bool,
    ) -> Self {
        Self {
            config,
            config_hash,
            source,
            store,
            budget,
            fresh,
            phase: RunPhase::AuthCheck,
        }
    }

    /// Returns the current run phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves to the next phase, rejecting transitions the run does not allow
    fn transition(&mut self, next: RunPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!("Run phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs every phase in order
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run completed or ended early on budget
    /// * `Err(HarvestError)` - Authentication failed, the catalog could not be
    ///   written, or this orchestrator already finished a run
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.phase.is_terminal() {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: RunPhase::AuthCheck,
            });
        }

        // Phase: AuthCheck
        tracing::info!("Testing authentication...");
        if !self.source.probe().await {
            self.transition(RunPhase::Aborted)?;
            tracing::error!("Authentication failed");
            return Err(HarvestError::AuthenticationFailed(
                "canary search returned no foods_search envelope".to_string(),
            ));
        }
        tracing::info!("Authentication successful");

        // Phase: LoadExisting
        self.transition(RunPhase::LoadExisting)?;
        let existing = if self.fresh {
            tracing::info!("Fresh run: ignoring existing catalog state");
            ExistingState::default()
        } else {
            self.store.load_existing()?
        };
        let known_food_ids = existing.food_ids.clone();

        // Phase: Discover
        self.transition(RunPhase::Discover)?;
        let discovery = self.discover().await;

        let mut report = RunReport {
            phase: self.phase,
            discovered: DiscoveryCounts {
                brands: discovery.brands.len(),
                restaurants: discovery.restaurants.len(),
                categories: discovery.categories.len(),
                foods: discovery.all_foods.len(),
            },
            new_foods: discovery
                .all_foods
                .keys()
                .filter(|id| !known_food_ids.contains(*id))
                .count(),
            extraction_results: ExtractionResults::default(),
            outcomes: Vec::new(),
            files_written: 0,
            requests_used: 0,
            request_ceiling: self.budget.ceiling(),
            terminated_early: discovery.halted_on_budget,
        };

        // Phases: ExtractBrands, ExtractRestaurants, ExtractCategories
        for kind in EntityKind::all() {
            self.transition(RunPhase::extracting(kind))?;
            let completed = self
                .extract_kind(kind, &discovery, &existing, &mut report)
                .await?;

            if !completed {
                report.terminated_early = true;
                break;
            }
        }

        // Phase: Persist
        self.transition(RunPhase::Persist)?;
        report.requests_used = self.budget.issued();
        self.persist(&discovery, &report)?;

        self.transition(RunPhase::Done)?;
        report.phase = self.phase;

        tracing::info!(
            "Run complete: {} files written, {} requests used of {}",
            report.files_written,
            report.requests_used,
            report.request_ceiling
        );

        Ok(report)
    }

    /// Runs discovery, seeding brands from the remote catalog when enabled
    ///
    /// The catalog is fetched before any seed term is paged so that term
    /// discovery cannot spend the budget it needs.
    async fn discover(&self) -> Discovery {
        let settings = DiscoverySettings::from_config(&self.config.discovery);

        let catalog = if self.config.discovery.use_brand_catalog {
            self.fetch_brand_catalog().await
        } else {
            None
        };

        let mut discovery = discover(
            &self.source,
            &self.config.discovery.seed_terms,
            &settings,
            &self.budget,
        )
        .await;

        if let Some(catalog) = catalog {
            let added = discovery.seed_brands(catalog.names());
            tracing::info!(
                "Brand catalog ({}) added {} of {} brands",
                catalog.shape(),
                added,
                catalog.names().len()
            );
        }

        discovery
    }

    async fn fetch_brand_catalog(&self) -> Option<BrandCatalog> {
        if self.budget.is_exhausted() {
            tracing::warn!("Request budget margin reached, skipping brand catalog");
            return None;
        }

        let catalog = self.source.brand_catalog().await;
        if catalog.is_none() {
            tracing::warn!("Brand catalog returned no data");
        }
        catalog
    }

    /// Extracts every selected candidate of one kind
    ///
    /// Returns false if the phase ended early because of the budget.
    async fn extract_kind(
        &self,
        kind: EntityKind,
        discovery: &Discovery,
        existing: &ExistingState,
        report: &mut RunReport,
    ) -> Result<bool> {
        let cap = match kind {
            EntityKind::Brand => self.config.extraction.max_brands,
            EntityKind::Restaurant => self.config.extraction.max_restaurants,
            EntityKind::Category => self.config.extraction.max_categories,
        };
        let candidates = select_candidates(discovery.names(kind), existing.keys(kind), cap);
        let policy = ExtractionPolicy::for_kind(kind, &self.config.extraction);

        tracing::info!(
            "Extracting {} new {} entities ({} discovered, {} already in catalog)",
            candidates.len(),
            kind,
            discovery.names(kind).len(),
            existing.keys(kind).len()
        );

        for (index, (name, key)) in candidates.iter().enumerate() {
            if self.budget.is_exhausted() {
                tracing::warn!(
                    "Request budget margin reached at {} {}/{} ({} requests remaining), persisting early",
                    kind,
                    index + 1,
                    candidates.len(),
                    self.budget.remaining()
                );
                return Ok(false);
            }

            let extraction = extract(&self.source, name, kind, &policy, &self.budget).await;

            let persisted = match extraction.clone().into_entity() {
                Some(entity) => {
                    self.store.save(&entity)?;
                    report.files_written += 1;
                    true
                }
                None => false,
            };

            report
                .extraction_results
                .record(kind, name, extraction.items.len());
            report.outcomes.push(extraction.outcome(key, persisted));

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {}/{} {} entities, {} items, {} requests used",
                    index + 1,
                    candidates.len(),
                    kind,
                    report.extraction_results.total(kind),
                    self.budget.issued()
                );
            }
        }

        Ok(true)
    }

    /// Writes the aggregate discovery file and the run log
    fn persist(&self, discovery: &Discovery, report: &RunReport) -> Result<()> {
        let timestamp = format_timestamp(&Utc::now());
        let sorted = |kind: EntityKind| discovery.names(kind).iter().cloned().collect::<Vec<_>>();

        let aggregate = AggregateReport {
            timestamp: timestamp.clone(),
            total_foods_discovered: discovery.all_foods.len(),
            new_foods_discovered: report.new_foods,
            categories_discovered: discovery.categories.len(),
            brands_discovered: discovery.brands.len(),
            restaurants_discovered: discovery.restaurants.len(),
            api_requests_used: report.requests_used,
            discovery_method: AGGREGATE_METHOD.to_string(),
            source: self.config.output.source_label.clone(),
            extraction_results: report.extraction_results.clone(),
            foods: discovery.all_foods.values().cloned().collect(),
            discovered_categories: sorted(EntityKind::Category),
            discovered_brands: sorted(EntityKind::Brand),
            discovered_restaurants: sorted(EntityKind::Restaurant),
        };
        self.store.save_aggregate(&aggregate)?;

        let log = DiscoveryLog {
            timestamp,
            config_hash: self.config_hash.clone(),
            discovered: report.discovered.clone(),
            extractions: report.outcomes.clone(),
            requests_used: report.requests_used,
            request_ceiling: report.request_ceiling,
            terminated_early: report.terminated_early,
        };
        self.store.append_log(&log)?;

        Ok(())
    }
}

/// Picks the entities of one kind to extract this run
///
/// Names are taken in sorted order. Names whose key is empty, already
/// persisted, or shared with an earlier name are skipped, and at most `cap`
/// candidates are returned.
///
/// # Returns
///
/// (name, key) pairs in extraction order
pub fn select_candidates(
    names: &BTreeSet<String>,
    persisted: &BTreeSet<String>,
    cap: usize,
) -> Vec<(String, String)> {
    let mut seen = BTreeSet::new();

    names
        .iter()
        .filter_map(|name| {
            let key = normalize_key(name);
            if key.is_empty() || persisted.contains(&key) || !seen.insert(key.clone()) {
                None
            } else {
                Some((name.clone(), key))
            }
        })
        .take(cap)
        .collect()
}

/// Runs a complete harvest against the configured remote API and catalog
///
/// This is the main entry point for a run. It will:
/// 1. Create the shared request budget
/// 2. Build the signed search client
/// 3. Prepare the catalog directories
/// 4. Drive the orchestrator through every phase
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Ignore prior catalog state
///
/// # Returns
///
/// * `Ok(RunReport)` - Run completed, possibly early on budget
/// * `Err(HarvestError)` - Run failed
pub async fn run_harvest(config: Config, config_hash: String, fresh: bool) -> Result<RunReport> {
    let budget = Arc::new(RequestBudget::from_config(&config.budget));
    let source = SearchClient::from_config(&config, Arc::clone(&budget))?;

    let store = FsCatalogStore::from_config(&config.output);
    store.ensure_layout()?;

    let mut orchestrator = Orchestrator::new(config, config_hash, source, store, budget, fresh);
    orchestrator.run().await
}
