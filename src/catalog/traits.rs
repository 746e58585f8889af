//! Catalog store trait and error types

use crate::catalog::model::{AggregateReport, DiscoveryLog, Entity, EntityKind, ExistingState};
use crate::output::CatalogStatistics;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during catalog store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entity name has no file-safe key: {0:?}")]
    InvalidKey(String),
}

/// Result type for catalog store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Summary of one persisted entity file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub key: String,
    pub name: String,
    pub total_items: usize,
}

/// Trait for catalog store implementations
///
/// The store exclusively owns the on-disk entity files and the persisted
/// food-id set. Engines only hand it finished entities.
pub trait CatalogStore {
    /// Reads prior run state
    ///
    /// # Returns
    ///
    /// Persisted entity keys per kind and the persisted food ids. A missing
    /// or unreadable aggregate file yields an empty food-id set.
    fn load_existing(&self) -> StoreResult<ExistingState>;

    /// Writes one entity file, replacing any previous version
    ///
    /// # Returns
    ///
    /// The path of the written file
    fn save(&self, entity: &Entity) -> StoreResult<PathBuf>;

    /// Writes the aggregate discovery file
    fn save_aggregate(&self, report: &AggregateReport) -> StoreResult<()>;

    /// Writes the run-level discovery log, replacing the previous one
    fn append_log(&self, log: &DiscoveryLog) -> StoreResult<()>;

    /// Lists the persisted entity files of one kind, sorted by key
    fn entity_summaries(&self, kind: EntityKind) -> StoreResult<Vec<EntitySummary>>;

    /// Summarizes entity file counts and item totals
    fn statistics(&self) -> StoreResult<CatalogStatistics>;
}
