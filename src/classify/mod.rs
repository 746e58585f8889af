//! Entity classification module
//!
//! This module maps observed search results to semantic roles:
//! - Brand and restaurant labels from the associated label
//! - Category tokens from the display name
//! - Per-kind match rules used during extraction

mod matcher;
mod rules;

pub use matcher::MatchRule;
pub use rules::{
    category_tokens, is_likely_restaurant_label, is_valid_brand_label, starts_uppercase,
    BRAND_STOPLIST, CATEGORY_STOPLIST, RESTAURANT_INDICATORS, RESTAURANT_STOPLIST,
};

use crate::client::RawResult;

/// Roles a single search result contributes to discovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    pub brand: Option<String>,
    pub restaurant: Option<String>,
    pub categories: Vec<String>,
}

/// Classifies search results into discovery roles
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    /// Accept capitalized labels as restaurants even without an indicator
    pub permissive_restaurants: bool,
}

impl Classifier {
    pub fn new(permissive_restaurants: bool) -> Self {
        Self {
            permissive_restaurants,
        }
    }

    /// Classifies one result
    ///
    /// A label may be both a brand and a restaurant.
    pub fn classify(&self, result: &RawResult) -> Roles {
        let label = result.label();

        let brand = (!label.is_empty() && is_valid_brand_label(label)).then(|| label.to_string());
        let restaurant = is_likely_restaurant_label(label, self.permissive_restaurants)
            .then(|| label.to_string());

        Roles {
            brand,
            restaurant,
            categories: category_tokens(&result.food_name),
        }
    }
}
