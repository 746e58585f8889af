//! Seed-term discovery
//!
//! Pages each seed term through the search source and harvests entity names
//! via the classifier. Every observed food is kept by id, first write wins.

use crate::catalog::{EntityKind, FoodItem};
use crate::classify::{is_valid_brand_label, Classifier};
use crate::client::{RequestBudget, SearchPage, SearchSource};
use crate::config::DiscoveryConfig;
use std::collections::{BTreeMap, BTreeSet};

/// Discovery behavior
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub max_pages_per_term: u32,
    pub classifier: Classifier,
}

impl DiscoverySettings {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            max_pages_per_term: config.max_pages_per_term,
            classifier: Classifier::new(config.permissive_restaurants),
        }
    }
}

/// Entity names and foods surfaced by one discovery phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub brands: BTreeSet<String>,
    pub restaurants: BTreeSet<String>,
    pub categories: BTreeSet<String>,

    /// Every observed food keyed by id
    pub all_foods: BTreeMap<String, FoodItem>,

    /// Search pages fetched across all terms
    pub pages_fetched: u32,

    /// True if discovery stopped because the budget crossed its margin
    pub halted_on_budget: bool,
}

impl Discovery {
    /// Returns the discovered names of one kind, sorted
    pub fn names(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::Brand => &self.brands,
            EntityKind::Restaurant => &self.restaurants,
            EntityKind::Category => &self.categories,
        }
    }

    /// Adds valid brand names from an external list
    ///
    /// Returns how many names were new.
    pub fn seed_brands<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) -> usize {
        let before = self.brands.len();
        for name in names {
            let name = name.trim();
            if is_valid_brand_label(name) {
                self.brands.insert(name.to_string());
            }
        }
        self.brands.len() - before
    }

    /// Records every row of one page
    fn absorb(&mut self, term: &str, page: &SearchPage, classifier: &Classifier) {
        for result in &page.items {
            self.all_foods
                .entry(result.food_id.clone())
                .or_insert_with(|| FoodItem::from_result(result, "").with_provenance(term));

            let roles = classifier.classify(result);
            if let Some(brand) = roles.brand {
                self.brands.insert(brand);
            }
            if let Some(restaurant) = roles.restaurant {
                self.restaurants.insert(restaurant);
            }
            self.categories.extend(roles.categories);
        }
    }
}

/// Runs discovery over the seed terms in order
///
/// Each term is paged until the remote has no more pages, the per-term page
/// cap is reached, or a page yields no data. Crossing the budget safety
/// margin halts discovery entirely.
///
/// # Arguments
///
/// * `source` - The search source to page
/// * `seeds` - Seed terms, in traversal order
/// * `settings` - Page cap and classifier
/// * `budget` - The shared request budget
///
/// # Returns
///
/// The deduplicated discovery sets; partial if the budget ran out
pub async fn discover(
    source: &dyn SearchSource,
    seeds: &[String],
    settings: &DiscoverySettings,
    budget: &RequestBudget,
) -> Discovery {
    let mut discovery = Discovery::default();

    'terms: for (index, term) in seeds.iter().enumerate() {
        tracing::info!("Discovering with term '{}' ({}/{})", term, index + 1, seeds.len());

        for page_number in 0..settings.max_pages_per_term {
            if budget.is_exhausted() {
                tracing::warn!(
                    "Request budget margin reached after {} requests, stopping discovery",
                    budget.issued()
                );
                discovery.halted_on_budget = true;
                break 'terms;
            }

            let page = match source.search_page(term, page_number).await {
                Some(page) => page,
                None => break,
            };

            discovery.absorb(term, &page, &settings.classifier);
            discovery.pages_fetched += 1;

            tracing::debug!(
                "'{}' page {}: +{} foods | {} foods, {} brands, {} restaurants, {} categories",
                term,
                page_number + 1,
                page.items.len(),
                discovery.all_foods.len(),
                discovery.brands.len(),
                discovery.restaurants.len(),
                discovery.categories.len()
            );

            if !page.has_more() {
                break;
            }
        }
    }

    tracing::info!(
        "Discovery finished: {} foods, {} brands, {} restaurants, {} categories ({} pages)",
        discovery.all_foods.len(),
        discovery.brands.len(),
        discovery.restaurants.len(),
        discovery.categories.len(),
        discovery.pages_fetched
    );

    discovery
}
