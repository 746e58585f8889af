//! Extraction match rules
//!
//! Decides whether a search result belongs to the entity being extracted.
//! All comparisons are case-insensitive.

use crate::catalog::EntityKind;
use crate::client::RawResult;

/// Per-kind rule for accepting a search result during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Label equals the brand, or contains it within `length_slack` characters
    Brand { length_slack: usize },

    /// Label equals or mutually contains the restaurant, or the food name mentions it
    Restaurant,

    /// Every result is kept
    Unfiltered,
}

impl MatchRule {
    /// Returns the rule used for an entity kind
    pub fn for_kind(kind: EntityKind, brand_length_slack: usize) -> Self {
        match kind {
            EntityKind::Brand => Self::Brand {
                length_slack: brand_length_slack,
            },
            EntityKind::Restaurant => Self::Restaurant,
            EntityKind::Category => Self::Unfiltered,
        }
    }

    /// Checks whether a result belongs to the named entity
    ///
    /// # Arguments
    ///
    /// * `entity` - The entity's canonical name
    /// * `result` - One row returned by the search for that name
    pub fn matches(&self, entity: &str, result: &RawResult) -> bool {
        let entity = entity.to_lowercase();
        let label = result.label().to_lowercase();

        match self {
            Self::Brand { length_slack } => {
                if label == entity {
                    return true;
                }
                let diff = label.chars().count().abs_diff(entity.chars().count());
                label.contains(&entity) && diff <= *length_slack
            }
            Self::Restaurant => {
                if label == entity {
                    return true;
                }
                // An empty label is contained in every name
                if !label.is_empty() && (label.contains(&entity) || entity.contains(&label)) {
                    return true;
                }
                result.food_name.to_lowercase().contains(&entity)
            }
            Self::Unfiltered => true,
        }
    }
}
