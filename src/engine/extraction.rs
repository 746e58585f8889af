//! Per-entity extraction
//!
//! Pages the search source for one entity name and keeps the results that the
//! kind's match rule accepts, deduplicated by food id.

use crate::catalog::{
    Entity, EntityKind, ExtractionMeta, ExtractionOutcome, FoodItem, StopReason,
};
use crate::classify::MatchRule;
use crate::client::{RequestBudget, SearchSource};
use crate::config::ExtractionConfig;
use chrono::Utc;
use std::collections::HashSet;

/// How one kind of entity is extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Maximum pages walked per entity
    pub max_pages: u32,

    /// Consecutive zero-match pages tolerated before stopping
    pub patience: u32,

    pub rule: MatchRule,
}

impl ExtractionPolicy {
    /// Builds the policy of a kind from the `[extraction]` section
    ///
    /// Categories read only their first page, unfiltered.
    pub fn for_kind(kind: EntityKind, config: &ExtractionConfig) -> Self {
        let max_pages = match kind {
            EntityKind::Brand => config.brand_max_pages,
            EntityKind::Restaurant => config.restaurant_max_pages,
            EntityKind::Category => 1,
        };

        Self {
            max_pages,
            patience: config.patience,
            rule: MatchRule::for_kind(kind, config.brand_length_slack),
        }
    }
}

/// Result of extracting one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub kind: EntityKind,
    pub name: String,

    /// Matched items in first-seen order, unique by id
    pub items: Vec<FoodItem>,

    pub pages_walked: u32,
    pub total_remote_count: u64,
    pub stop_reason: StopReason,
}

impl Extraction {
    /// Converts into an entity, or None when nothing matched
    pub fn into_entity(self) -> Option<Entity> {
        if self.items.is_empty() {
            return None;
        }

        let meta = ExtractionMeta {
            pages_walked: self.pages_walked,
            total_remote_count: self.total_remote_count,
            last_updated: Utc::now(),
            stop_reason: self.stop_reason,
        };

        Some(Entity::new(self.kind, &self.name, self.items, meta))
    }

    /// Summarizes the extraction for the run log
    pub fn outcome(&self, key: &str, persisted: bool) -> ExtractionOutcome {
        ExtractionOutcome {
            kind: self.kind,
            name: self.name.clone(),
            key: key.to_string(),
            items: self.items.len(),
            pages_walked: self.pages_walked,
            total_remote_count: self.total_remote_count,
            stop_reason: self.stop_reason,
            persisted,
        }
    }
}

/// Extracts every matching item of one entity
///
/// Paging stops when the remote has no more pages, the page cap is reached,
/// `patience` consecutive pages match nothing, a page yields no data, or the
/// budget crosses its safety margin. Items collected before a stop are kept.
///
/// # Arguments
///
/// * `source` - The search source to page
/// * `name` - The entity's canonical name, used as the search expression
/// * `kind` - The entity kind
/// * `policy` - Page cap, patience, and match rule for the kind
/// * `budget` - The shared request budget
pub async fn extract(
    source: &dyn SearchSource,
    name: &str,
    kind: EntityKind,
    policy: &ExtractionPolicy,
    budget: &RequestBudget,
) -> Extraction {
    let label_fallback = match kind {
        EntityKind::Brand | EntityKind::Restaurant => name,
        EntityKind::Category => "",
    };

    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut pages_walked = 0;
    let mut total_remote_count = 0;
    let mut misses = 0;
    let mut page_number = 0;

    let stop_reason = loop {
        if page_number >= policy.max_pages {
            break StopReason::PageCap;
        }

        if budget.is_exhausted() {
            break StopReason::BudgetExhausted;
        }

        let page = match source.search_page(name, page_number).await {
            Some(page) => page,
            None if budget.is_exhausted() => break StopReason::BudgetExhausted,
            None => break StopReason::NoData,
        };

        pages_walked += 1;
        total_remote_count = page.total_remote_count;

        let mut matched = 0;
        for result in page.items.iter().filter(|r| policy.rule.matches(name, r)) {
            matched += 1;
            if seen.insert(result.food_id.clone()) {
                items.push(FoodItem::from_result(result, label_fallback));
            }
        }

        tracing::debug!(
            "{} '{}' page {}: +{} matches ({} total)",
            kind,
            name,
            page_number + 1,
            matched,
            items.len()
        );

        if matched == 0 {
            misses += 1;
        } else {
            misses = 0;
        }

        if !page.has_more() {
            break StopReason::RemoteExhausted;
        }

        if misses >= policy.patience {
            break StopReason::Patience;
        }

        page_number += 1;
    };

    tracing::debug!(
        "Extracted {} '{}': {} items over {} pages ({:?})",
        kind,
        name,
        items.len(),
        pages_walked,
        stop_reason
    );

    Extraction {
        kind,
        name: name.to_string(),
        items,
        pages_walked,
        total_remote_count,
        stop_reason,
    }
}
