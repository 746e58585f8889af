//! Statistics generation from the on-disk catalog
//!
//! This module provides functionality for summarizing and displaying the
//! entity files and food ids held by a catalog store.

use crate::catalog::{CatalogStore, EntityKind, EntitySummary, StoreResult};

/// Number of largest entities listed per kind
const TOP_ENTITIES: usize = 5;

/// Statistics of one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindStatistics {
    pub kind: EntityKind,

    /// Number of entity files
    pub files: usize,

    /// Sum of `total_items` across files
    pub total_items: usize,

    /// Entities with the most items, largest first
    pub largest: Vec<EntitySummary>,
}

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Per-kind statistics in extraction order
    pub kinds: Vec<KindStatistics>,

    /// Food ids recorded in the aggregate discovery file
    pub known_foods: usize,
}

impl CatalogStatistics {
    /// Total entity files across all kinds
    pub fn total_files(&self) -> usize {
        self.kinds.iter().map(|k| k.files).sum()
    }

    /// Total items across all entity files
    pub fn total_items(&self) -> usize {
        self.kinds.iter().map(|k| k.total_items).sum()
    }
}

/// Loads statistics from a catalog store
///
/// # Arguments
///
/// * `store` - The catalog store to summarize
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(StoreError)` - Failed to list the catalog
pub fn load_statistics(store: &dyn CatalogStore) -> StoreResult<CatalogStatistics> {
    let mut kinds = Vec::new();

    for kind in EntityKind::all() {
        let mut summaries = store.entity_summaries(kind)?;
        let files = summaries.len();
        let total_items = summaries.iter().map(|s| s.total_items).sum();

        summaries.sort_by(|a, b| b.total_items.cmp(&a.total_items).then(a.key.cmp(&b.key)));
        summaries.truncate(TOP_ENTITIES);

        kinds.push(KindStatistics {
            kind,
            files,
            total_items,
            largest: summaries,
        });
    }

    let known_foods = store.load_existing()?.food_ids.len();

    Ok(CatalogStatistics { kinds, known_foods })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Entity files: {}", stats.total_files());
    println!("  Items across entity files: {}", stats.total_items());
    println!("  Known foods (aggregate): {}", stats.known_foods);
    println!();

    for kind in &stats.kinds {
        println!(
            "{} ({} files, {} items):",
            kind.kind.dir_name(),
            kind.files,
            kind.total_items
        );
        for entity in &kind.largest {
            println!("  - {} ({} items)", entity.name, entity.total_items);
        }
        println!();
    }
}
