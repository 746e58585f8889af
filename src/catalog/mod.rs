//! Catalog module
//!
//! This module owns the persisted catalog:
//! - Entity key normalization
//! - The food item, entity, and run log data model
//! - The [`CatalogStore`] trait and its filesystem implementation

mod key;
mod model;
mod store;
mod traits;

pub use key::normalize_key;
pub use model::{
    format_timestamp, AggregateReport, DiscoveryCounts, DiscoveryLog, Entity, EntityKind,
    EntityRecord, ExistingState, ExtractionMeta, ExtractionOutcome, ExtractionResults, FoodItem,
    StopReason,
};
pub use store::{FsCatalogStore, AGGREGATE_FILE, LOG_FILE};
pub use traits::{CatalogStore, EntitySummary, StoreError, StoreResult};
