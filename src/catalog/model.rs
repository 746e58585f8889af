//! Catalog data model
//!
//! Defines the persisted units of the catalog and the on-disk layout of
//! entity files, the aggregate discovery file, and the discovery log.

use crate::catalog::key::normalize_key;
use crate::client::RawResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The canonical persisted food record
///
/// `food_id` is the sole identity; a record is never mutated after it is
/// first observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub food_id: String,
    pub food_name: String,
    pub food_description: String,
    pub food_url: String,
    pub brand_name: String,
    pub food_type: String,

    /// Seed term that surfaced the item during discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_via: Option<String>,
}

impl FoodItem {
    /// Builds an item from a search row
    ///
    /// # Arguments
    ///
    /// * `result` - The search row
    /// * `label_fallback` - Label used when the row carries none
    pub fn from_result(result: &RawResult, label_fallback: &str) -> Self {
        let label = result.brand_name.as_deref().unwrap_or("");

        Self {
            food_id: result.food_id.clone(),
            food_name: result.food_name.clone(),
            food_description: result.food_description.clone(),
            food_url: result.food_url.clone(),
            brand_name: if label.is_empty() {
                label_fallback.to_string()
            } else {
                label.to_string()
            },
            food_type: result.food_type.clone(),
            discovered_via: None,
        }
    }

    /// Records the seed term that surfaced the item
    pub fn with_provenance(mut self, term: &str) -> Self {
        self.discovered_via = Some(term.to_string());
        self
    }
}

/// The kinds of entity extraction is organized around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Brand,
    Restaurant,
    Category,
}

impl EntityKind {
    /// Directory under the catalog root holding this kind's files
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Brand => "brands",
            Self::Restaurant => "restaurants",
            Self::Category => "categories",
        }
    }

    /// Field of an entity file that carries the entity name
    pub fn name_field(&self) -> &'static str {
        match self {
            Self::Brand => "brand_name",
            Self::Restaurant => "restaurant",
            Self::Category => "category",
        }
    }

    pub fn discovery_method(&self) -> &'static str {
        match self {
            Self::Brand => "Dynamic brand discovery",
            Self::Restaurant => "Dynamic restaurant discovery",
            Self::Category => "Dynamic category discovery",
        }
    }

    /// Returns all kinds in extraction order
    pub fn all() -> [Self; 3] {
        [Self::Brand, Self::Restaurant, Self::Category]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brand => write!(f, "brand"),
            Self::Restaurant => write!(f, "restaurant"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// Why an extraction stopped paging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The remote reported no further pages
    RemoteExhausted,

    /// The per-entity page cap was reached
    PageCap,

    /// Too many consecutive pages without a match
    Patience,

    /// The request budget crossed its safety margin
    BudgetExhausted,

    /// A page yielded no usable response
    NoData,
}

impl StopReason {
    /// Returns true if the entity may have more items than were collected
    pub fn is_truncated(&self) -> bool {
        !matches!(self, Self::RemoteExhausted)
    }
}

/// Metadata recorded about one extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMeta {
    pub pages_walked: u32,
    pub total_remote_count: u64,
    pub last_updated: DateTime<Utc>,
    pub stop_reason: StopReason,
}

/// A discovered brand, restaurant, or category with its extracted items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub key: String,
    pub items: Vec<FoodItem>,
    pub meta: ExtractionMeta,
}

impl Entity {
    /// Creates an entity, deriving its key from the name
    pub fn new(kind: EntityKind, name: &str, items: Vec<FoodItem>, meta: ExtractionMeta) -> Self {
        Self {
            kind,
            name: name.to_string(),
            key: normalize_key(name),
            items,
            meta,
        }
    }

    /// Returns a serializable view of the entity file
    pub fn record<'a>(&'a self, source: &'a str) -> EntityRecord<'a> {
        EntityRecord {
            entity: self,
            source,
        }
    }
}

/// Formats a timestamp the way every catalog file stores it
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// On-disk layout of one entity file
///
/// The first field is named after the entity kind, so the layout is written
/// by hand with a fixed field order.
pub struct EntityRecord<'a> {
    entity: &'a Entity,
    source: &'a str,
}

impl Serialize for EntityRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entity = self.entity;
        let mut state = serializer.serialize_struct("Entity", 9)?;
        state.serialize_field(entity.kind.name_field(), &entity.name)?;
        state.serialize_field("total_items", &entity.items.len())?;
        state.serialize_field("pages_extracted", &entity.meta.pages_walked)?;
        state.serialize_field("total_search_results", &entity.meta.total_remote_count)?;
        state.serialize_field("stop_reason", &entity.meta.stop_reason)?;
        state.serialize_field("discovery_method", entity.kind.discovery_method())?;
        state.serialize_field("last_updated", &format_timestamp(&entity.meta.last_updated))?;
        state.serialize_field("source", self.source)?;
        state.serialize_field("items", &entity.items)?;
        state.end()
    }
}

/// Prior run state recovered from disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingState {
    pub brand_keys: BTreeSet<String>,
    pub restaurant_keys: BTreeSet<String>,
    pub category_keys: BTreeSet<String>,
    pub food_ids: BTreeSet<String>,
}

impl ExistingState {
    /// Returns the persisted keys of one kind
    pub fn keys(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::Brand => &self.brand_keys,
            EntityKind::Restaurant => &self.restaurant_keys,
            EntityKind::Category => &self.category_keys,
        }
    }

    pub(crate) fn keys_mut(&mut self, kind: EntityKind) -> &mut BTreeSet<String> {
        match kind {
            EntityKind::Brand => &mut self.brand_keys,
            EntityKind::Restaurant => &mut self.restaurant_keys,
            EntityKind::Category => &mut self.category_keys,
        }
    }
}

/// Items extracted per entity name, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResults {
    pub categories: BTreeMap<String, usize>,
    pub brands: BTreeMap<String, usize>,
    pub restaurants: BTreeMap<String, usize>,
}

impl ExtractionResults {
    pub fn record(&mut self, kind: EntityKind, name: &str, items: usize) {
        let target = match kind {
            EntityKind::Brand => &mut self.brands,
            EntityKind::Restaurant => &mut self.restaurants,
            EntityKind::Category => &mut self.categories,
        };
        target.insert(name.to_string(), items);
    }

    /// Total items extracted for one kind
    pub fn total(&self, kind: EntityKind) -> usize {
        let source = match kind {
            EntityKind::Brand => &self.brands,
            EntityKind::Restaurant => &self.restaurants,
            EntityKind::Category => &self.categories,
        };
        source.values().sum()
    }
}

/// Layout of `discovered/all-foods.json`
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub timestamp: String,
    pub total_foods_discovered: usize,
    pub new_foods_discovered: usize,
    pub categories_discovered: usize,
    pub brands_discovered: usize,
    pub restaurants_discovered: usize,
    pub api_requests_used: u64,
    pub discovery_method: String,
    pub source: String,
    pub extraction_results: ExtractionResults,
    pub foods: Vec<FoodItem>,
    pub discovered_categories: Vec<String>,
    pub discovered_brands: Vec<String>,
    pub discovered_restaurants: Vec<String>,
}

/// Number of entities surfaced per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryCounts {
    pub brands: usize,
    pub restaurants: usize,
    pub categories: usize,
    pub foods: usize,
}

/// Outcome of one entity extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub kind: EntityKind,
    pub name: String,
    pub key: String,
    pub items: usize,
    pub pages_walked: u32,
    pub total_remote_count: u64,
    pub stop_reason: StopReason,

    /// False when nothing matched and no file was written
    pub persisted: bool,
}

/// Layout of `discovery-log.json`, written once per run
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryLog {
    pub timestamp: String,
    pub config_hash: String,
    pub discovered: DiscoveryCounts,
    pub extractions: Vec<ExtractionOutcome>,
    pub requests_used: u64,
    pub request_ceiling: u64,

    /// True when a phase ended because the budget crossed its margin
    pub terminated_early: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(label: Option<&str>) -> RawResult {
        RawResult {
            food_id: "101".to_string(),
            food_name: "Cheddar Cheese".to_string(),
            food_description: "Per 1 slice".to_string(),
            food_url: "https://foods.example/101".to_string(),
            brand_name: label.map(str::to_string),
            food_type: "Brand".to_string(),
        }
    }

    fn meta() -> ExtractionMeta {
        ExtractionMeta {
            pages_walked: 2,
            total_remote_count: 57,
            last_updated: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            stop_reason: StopReason::RemoteExhausted,
        }
    }

    #[test]
    fn test_label_fallback() {
        assert_eq!(FoodItem::from_result(&raw(None), "Kraft").brand_name, "Kraft");
        assert_eq!(FoodItem::from_result(&raw(Some("")), "Kraft").brand_name, "Kraft");
        assert_eq!(
            FoodItem::from_result(&raw(Some("Kraft Heinz")), "Kraft").brand_name,
            "Kraft Heinz"
        );
        assert_eq!(FoodItem::from_result(&raw(None), "").brand_name, "");
    }

    #[test]
    fn test_entity_key_derived() {
        let entity = Entity::new(EntityKind::Brand, "Ben & Jerry's", vec![], meta());
        assert_eq!(entity.key, "ben_jerrys");
    }

    #[test]
    fn test_entity_record_field_order() {
        let items = vec![FoodItem::from_result(&raw(None), "Kraft")];
        let entity = Entity::new(EntityKind::Brand, "Kraft", items, meta());

        let json = serde_json::to_string(&entity.record("Test Source")).unwrap();
        assert!(json.starts_with(
            "{\"brand_name\":\"Kraft\",\"total_items\":1,\"pages_extracted\":2,\
             \"total_search_results\":57,\"stop_reason\":\"remote_exhausted\",\
             \"discovery_method\":\"Dynamic brand discovery\",\
             \"last_updated\":\"2024-03-01T12:00:00.000Z\",\"source\":\"Test Source\",\"items\":["
        ));
        assert!(!json.contains("discovered_via"));
    }

    #[test]
    fn test_kind_name_field() {
        let entity = Entity::new(EntityKind::Category, "cheese", vec![], meta());
        let value = serde_json::to_value(entity.record("s")).unwrap();
        assert_eq!(value["category"], "cheese");

        let entity = Entity::new(EntityKind::Restaurant, "Pizza Hut", vec![], meta());
        let value = serde_json::to_value(entity.record("s")).unwrap();
        assert_eq!(value["restaurant"], "Pizza Hut");
    }

    #[test]
    fn test_provenance_serialized_when_present() {
        let item = FoodItem::from_result(&raw(None), "").with_provenance("cheese");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["discovered_via"], "cheese");
    }

    #[test]
    fn test_extraction_results_totals() {
        let mut results = ExtractionResults::default();
        results.record(EntityKind::Brand, "Kraft", 3);
        results.record(EntityKind::Brand, "Heinz", 4);
        results.record(EntityKind::Category, "cheese", 50);

        assert_eq!(results.total(EntityKind::Brand), 7);
        assert_eq!(results.total(EntityKind::Restaurant), 0);
        assert_eq!(results.total(EntityKind::Category), 50);
    }

    #[test]
    fn test_stop_reason_truncation() {
        assert!(!StopReason::RemoteExhausted.is_truncated());
        assert!(StopReason::BudgetExhausted.is_truncated());
        assert!(StopReason::Patience.is_truncated());
    }
}
