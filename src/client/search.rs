//! Paginated food search
//!
//! Wraps the signed client with the `foods.search.v3` pagination protocol:
//! a fixed page size, a page is full iff it returned exactly that many rows,
//! and another page exists iff `(page + 1) * size < total AND full`.

use crate::client::brands::BrandCatalog;
use crate::client::budget::RequestBudget;
use crate::client::signed::SignedClient;
use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

/// Remote procedure for paginated food search
pub const SEARCH_METHOD: &str = "foods.search.v3";

/// Remote procedure for the brand catalog
pub const BRAND_CATALOG_METHOD: &str = "food_brands.get.v2";

/// Term used by the authentication canary
pub const PROBE_TERM: &str = "apple";

/// One row returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawResult {
    #[serde(deserialize_with = "string_or_number")]
    pub food_id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub food_name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub food_description: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub food_url: String,

    /// Associated brand or restaurant label, absent for generic foods
    #[serde(default)]
    pub brand_name: Option<String>,

    /// "Generic" or "Brand"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub food_type: String,
}

impl RawResult {
    /// Returns the trimmed associated label, or "" when absent
    pub fn label(&self) -> &str {
        self.brand_name.as_deref().unwrap_or("").trim()
    }
}

/// The remote sends ids as strings but numbers are accepted too
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(n) => n.to_string(),
    })
}

/// Text fields may arrive as `null`, which reads as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One decoded page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Well-formed rows, in remote order
    pub items: Vec<RawResult>,

    /// Total matches the remote reports for the expression
    pub total_remote_count: u64,

    pub page_number: u32,
    pub page_size: u32,

    /// Rows the remote sent, including malformed ones that were dropped
    pub rows: usize,
}

impl SearchPage {
    /// Returns true if the page returned exactly the page size
    pub fn is_full(&self) -> bool {
        self.rows == self.page_size as usize
    }

    /// Returns true if a further page should be requested
    pub fn has_more(&self) -> bool {
        let seen = (self.page_number as u64 + 1) * self.page_size as u64;
        seen < self.total_remote_count && self.is_full()
    }
}

/// Parses a count that may arrive as a JSON string or number
fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Decodes a `foods.search.v3` response
///
/// # Arguments
///
/// * `value` - The JSON response body
/// * `page_number` - The page that was requested
/// * `page_size` - The page size that was requested
///
/// # Returns
///
/// * `Some(SearchPage)` - The envelope carried a `results.food` list or object
/// * `None` - Missing or malformed envelope, treated as "no more pages"
pub fn decode_search_page(value: &Value, page_number: u32, page_size: u32) -> Option<SearchPage> {
    let envelope = value.get("foods_search")?;

    let total_remote_count = envelope.get("total_results").map(parse_count).unwrap_or(0);

    let food = envelope.get("results")?.get("food")?;
    let rows: Vec<&Value> = match food {
        Value::Array(rows) => rows.iter().collect(),
        Value::Object(_) => vec![food],
        _ => return None,
    };

    let items: Vec<RawResult> = rows
        .iter()
        .filter_map(|row| match RawResult::deserialize(*row) {
            Ok(result) if !result.food_id.trim().is_empty() => Some(result),
            Ok(_) => {
                tracing::warn!("Dropping search row without food_id");
                None
            }
            Err(e) => {
                tracing::warn!("Dropping malformed search row: {}", e);
                None
            }
        })
        .collect();

    Some(SearchPage {
        items,
        total_remote_count,
        page_number,
        page_size,
        rows: rows.len(),
    })
}

/// A paginated source of search results
///
/// The engines depend on this trait rather than on [`SearchClient`] so they
/// can be driven by an in-memory source in tests.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetches one page of results for an expression
    ///
    /// Returns None when the remote yields no data or an unusable envelope.
    async fn search_page(&self, expression: &str, page_number: u32) -> Option<SearchPage>;

    /// Checks that the source answers authenticated searches
    async fn probe(&self) -> bool {
        self.search_page(PROBE_TERM, 0).await.is_some()
    }

    /// Fetches the brand catalog, if the source has one
    async fn brand_catalog(&self) -> Option<BrandCatalog> {
        None
    }
}

/// Search client backed by the signed remote API
pub struct SearchClient {
    client: SignedClient,
    page_size: u32,
}

impl SearchClient {
    pub fn new(client: SignedClient, page_size: u32) -> Self {
        Self { client, page_size }
    }

    /// Builds the signed client and search client from configuration
    pub fn from_config(config: &Config, budget: Arc<RequestBudget>) -> Result<Self, reqwest::Error> {
        let client = SignedClient::new(&config.api, &config.client, budget)?;
        Ok(Self::new(client, config.api.page_size))
    }
}

#[async_trait]
impl SearchSource for SearchClient {
    async fn search_page(&self, expression: &str, page_number: u32) -> Option<SearchPage> {
        let params = [
            ("search_expression", expression.to_string()),
            ("max_results", self.page_size.to_string()),
            ("page_number", page_number.to_string()),
        ];

        let value = self.client.send(SEARCH_METHOD, &params).await?;
        let page = decode_search_page(&value, page_number, self.page_size);

        if page.is_none() {
            tracing::debug!(
                "No results envelope for '{}' page {}",
                expression,
                page_number
            );
        }

        page
    }

    /// Performs the authentication canary search
    ///
    /// Returns true if the remote answered with a `foods_search` envelope,
    /// even one without results.
    async fn probe(&self) -> bool {
        let params = [
            ("search_expression", PROBE_TERM.to_string()),
            ("max_results", "1".to_string()),
        ];

        match self.client.send(SEARCH_METHOD, &params).await {
            Some(value) => value.get("foods_search").is_some(),
            None => false,
        }
    }

    /// Fetches the remote brand catalog
    ///
    /// Returns None if the call produced no data at all.
    async fn brand_catalog(&self) -> Option<BrandCatalog> {
        let value = self.client.send(BRAND_CATALOG_METHOD, &[]).await?;
        Some(BrandCatalog::decode(&value))
    }
}
