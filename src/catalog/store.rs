//! Filesystem catalog store
//!
//! Layout under the catalog root:
//!
//! ```text
//! brands/<key>.json
//! restaurants/<key>.json
//! categories/<key>.json
//! discovered/all-foods.json
//! discovery-log.json
//! ```
//!
//! Files are pretty-printed JSON with a trailing newline. Writes replace whole
//! files and are not transactional across files.

use crate::catalog::key::normalize_key;
use crate::catalog::model::{AggregateReport, DiscoveryLog, Entity, EntityKind, ExistingState};
use crate::catalog::traits::{CatalogStore, EntitySummary, StoreError, StoreResult};
use crate::config::OutputConfig;
use crate::output::{load_statistics, CatalogStatistics};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Aggregate discovery file, relative to the catalog root
pub const AGGREGATE_FILE: &str = "discovered/all-foods.json";

/// Run log file, relative to the catalog root
pub const LOG_FILE: &str = "discovery-log.json";

/// Catalog store backed by a directory of JSON files
#[derive(Debug, Clone)]
pub struct FsCatalogStore {
    root: PathBuf,
    source_label: String,
}

impl FsCatalogStore {
    /// Creates a store rooted at `root`; nothing is touched on disk yet
    pub fn new(root: impl Into<PathBuf>, source_label: &str) -> Self {
        Self {
            root: root.into(),
            source_label: source_label.to_string(),
        }
    }

    /// Creates a store from the `[output]` configuration section
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.catalog_dir, &config.source_label)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Path of an entity file
    pub fn entity_path(&self, kind: EntityKind, key: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{}.json", key))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.root.join(AGGREGATE_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Creates the root and every catalog directory
    pub fn ensure_layout(&self) -> StoreResult<()> {
        for kind in EntityKind::all() {
            fs::create_dir_all(self.root.join(kind.dir_name()))?;
        }
        if let Some(parent) = self.aggregate_path().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Lists `*.json` files in a kind directory, sorted by path
    fn json_files(&self, kind: EntityKind) -> StoreResult<Vec<PathBuf>> {
        let dir = self.root.join(kind.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Reads persisted entity keys of one kind from file stems
    fn load_keys(&self, kind: EntityKind) -> StoreResult<BTreeSet<String>> {
        let keys = self
            .json_files(kind)?
            .iter()
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()))
            .map(normalize_key)
            .filter(|key| !key.is_empty())
            .collect();

        Ok(keys)
    }

    /// Reads food ids from the aggregate file
    ///
    /// A missing file is an empty set; an unreadable one is logged and also
    /// treated as empty.
    fn load_food_ids(&self) -> BTreeSet<String> {
        let path = self.aggregate_path();
        if !path.exists() {
            return BTreeSet::new();
        }

        let parsed = fs::read_to_string(&path)
            .map_err(StoreError::from)
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(StoreError::from));

        let value = match parsed {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read existing foods file {}: {}", path.display(), e);
                return BTreeSet::new();
            }
        };

        value
            .get("foods")
            .and_then(Value::as_array)
            .map(|foods| {
                foods
                    .iter()
                    .filter_map(|food| match food.get("food_id") {
                        Some(Value::String(id)) => Some(id.clone()),
                        Some(Value::Number(id)) => Some(id.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Writes pretty JSON with a trailing newline, creating parent directories
fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;

    Ok(())
}

impl CatalogStore for FsCatalogStore {
    fn load_existing(&self) -> StoreResult<ExistingState> {
        let mut state = ExistingState::default();

        for kind in EntityKind::all() {
            *state.keys_mut(kind) = self.load_keys(kind)?;
        }
        state.food_ids = self.load_food_ids();

        tracing::info!(
            "Existing catalog: {} brands, {} restaurants, {} categories, {} foods",
            state.brand_keys.len(),
            state.restaurant_keys.len(),
            state.category_keys.len(),
            state.food_ids.len()
        );

        Ok(state)
    }

    fn save(&self, entity: &Entity) -> StoreResult<PathBuf> {
        if entity.key.is_empty() {
            return Err(StoreError::InvalidKey(entity.name.clone()));
        }

        let path = self.entity_path(entity.kind, &entity.key);
        write_json(&path, &entity.record(&self.source_label))?;

        tracing::debug!("Saved {} '{}' to {}", entity.kind, entity.name, path.display());

        Ok(path)
    }

    fn save_aggregate(&self, report: &AggregateReport) -> StoreResult<()> {
        write_json(&self.aggregate_path(), report)
    }

    fn append_log(&self, log: &DiscoveryLog) -> StoreResult<()> {
        write_json(&self.log_path(), log)
    }

    fn entity_summaries(&self, kind: EntityKind) -> StoreResult<Vec<EntitySummary>> {
        let mut summaries = Vec::new();

        for path in self.json_files(kind)? {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let value: Value = match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(StoreError::from))
            {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entity file {}: {}", path.display(), e);
                    continue;
                }
            };

            let total_items = value
                .get("total_items")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .or_else(|| value.get("items").and_then(Value::as_array).map(Vec::len))
                .unwrap_or(0);

            summaries.push(EntitySummary {
                key: normalize_key(&stem),
                name: value
                    .get(kind.name_field())
                    .and_then(Value::as_str)
                    .unwrap_or(&stem)
                    .to_string(),
                total_items,
            });
        }

        Ok(summaries)
    }

    fn statistics(&self) -> StoreResult<CatalogStatistics> {
        load_statistics(self)
    }
}
