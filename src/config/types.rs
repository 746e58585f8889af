use serde::Deserialize;

/// Main configuration structure for Food-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote API endpoint and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// REST endpoint that receives signed form posts
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// OAuth consumer key; resolved from `consumer_key_env` when absent
    #[serde(rename = "consumer-key", default)]
    pub consumer_key: Option<String>,

    /// OAuth consumer secret; resolved from `consumer_secret_env` when absent
    #[serde(rename = "consumer-secret", default)]
    pub consumer_secret: Option<String>,

    /// Environment variable holding the consumer key
    #[serde(rename = "consumer-key-env", default = "default_key_env")]
    pub consumer_key_env: String,

    /// Environment variable holding the consumer secret
    #[serde(rename = "consumer-secret-env", default = "default_secret_env")]
    pub consumer_secret_env: String,

    /// Results requested per search page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

/// Signed request client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Minimum time between two sends (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Total attempts per request, including the first
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between failed attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Request budget for one run
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Hard ceiling on remote calls for the run
    #[serde(default = "default_ceiling")]
    pub ceiling: u64,

    /// Phases stop once `issued >= ceiling - safety_margin`
    #[serde(rename = "safety-margin", default = "default_safety_margin")]
    pub safety_margin: u64,
}

/// Seed-term discovery behavior
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(rename = "max-pages-per-term", default = "default_max_pages_per_term")]
    pub max_pages_per_term: u32,

    #[serde(rename = "seed-terms", default = "default_seed_terms")]
    pub seed_terms: Vec<String>,

    /// Seed the brand set from the remote brand catalog before term discovery
    #[serde(rename = "use-brand-catalog", default)]
    pub use_brand_catalog: bool,

    /// Also treat proper-noun labels as restaurants
    #[serde(rename = "permissive-restaurants", default)]
    pub permissive_restaurants: bool,
}

/// Per-entity extraction behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(rename = "max-brands", default = "default_max_brands")]
    pub max_brands: usize,

    #[serde(rename = "max-restaurants", default = "default_max_restaurants")]
    pub max_restaurants: usize,

    #[serde(rename = "max-categories", default = "default_max_categories")]
    pub max_categories: usize,

    #[serde(rename = "brand-max-pages", default = "default_brand_max_pages")]
    pub brand_max_pages: u32,

    #[serde(rename = "restaurant-max-pages", default = "default_restaurant_max_pages")]
    pub restaurant_max_pages: u32,

    /// Consecutive zero-match pages tolerated before stopping
    #[serde(default = "default_patience")]
    pub patience: u32,

    /// Maximum length difference for a "contains" brand match
    #[serde(rename = "brand-length-slack", default = "default_brand_length_slack")]
    pub brand_length_slack: usize,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the on-disk catalog
    #[serde(rename = "catalog-dir", default = "default_catalog_dir")]
    pub catalog_dir: String,

    /// Value written to the `source` field of every file
    #[serde(rename = "source-label", default = "default_source_label")]
    pub source_label: String,
}

/// Broad terms used to surface entities, in traversal order
pub const DEFAULT_SEED_TERMS: &[&str] = &[
    // Ultra-broad
    "food", "eat", "recipe", "dish", "meal", "snack", "drink", "beverage", "fresh", "organic",
    "natural", "frozen", "canned", "dried", "cooked", "raw", "baked", "fried", "grilled",
    "steamed", "boiled", "roasted",
    // Meals
    "breakfast", "lunch", "dinner", "dessert", "appetizer", "salad", "soup", "sandwich", "wrap",
    "bowl", "plate", "side", "main",
    // Nutrition
    "protein", "carb", "fat", "fiber", "vitamin", "mineral", "calorie", "healthy", "diet", "low",
    "high", "reduced", "light", "sugar",
    // Food groups
    "fruit", "vegetable", "meat", "dairy", "grain", "nuts", "seeds", "herbs", "spices", "oil",
    "sauce", "dressing", "condiment",
    // Cuisines
    "american", "chinese", "italian", "mexican", "indian", "thai", "japanese", "french", "greek",
    "mediterranean", "asian", "european", "latin", "african", "middle", "eastern", "korean",
    "vietnamese",
    // Ingredients
    "chicken", "beef", "pork", "fish", "turkey", "lamb", "cheese", "milk", "egg", "bread", "rice",
    "pasta", "potato", "tomato", "onion", "garlic", "pepper", "salt", "flour", "butter",
    // Brand and restaurant indicators
    "brand", "restaurant", "fast", "chain", "store", "market", "company", "signature", "select",
    "choice", "premium", "gourmet", "artisan",
    // Preparation
    "homemade", "instant", "ready", "prepared", "convenience", "deli", "bakery", "pizzeria",
    "cafe", "bistro", "grill", "kitchen",
];

fn default_endpoint() -> String {
    "https://platform.fatsecret.com/rest/server.api".to_string()
}

fn default_key_env() -> String {
    "FATSECRET_CLIENT_ID".to_string()
}

fn default_secret_env() -> String {
    "FATSECRET_CLIENT_SECRET".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("food-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_ceiling() -> u64 {
    4200
}

fn default_safety_margin() -> u64 {
    50
}

fn default_max_pages_per_term() -> u32 {
    30
}

fn default_seed_terms() -> Vec<String> {
    DEFAULT_SEED_TERMS.iter().map(|t| t.to_string()).collect()
}

fn default_max_brands() -> usize {
    150
}

fn default_max_restaurants() -> usize {
    100
}

fn default_max_categories() -> usize {
    200
}

fn default_brand_max_pages() -> u32 {
    30
}

fn default_restaurant_max_pages() -> u32 {
    50
}

fn default_patience() -> u32 {
    5
}

fn default_brand_length_slack() -> usize {
    5
}

fn default_catalog_dir() -> String {
    "./catalog".to_string()
}

fn default_source_label() -> String {
    "FatSecret Platform API (OAuth 1.0)".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            ceiling: default_ceiling(),
            safety_margin: default_safety_margin(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages_per_term: default_max_pages_per_term(),
            seed_terms: default_seed_terms(),
            use_brand_catalog: false,
            permissive_restaurants: false,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_brands: default_max_brands(),
            max_restaurants: default_max_restaurants(),
            max_categories: default_max_categories(),
            brand_max_pages: default_brand_max_pages(),
            restaurant_max_pages: default_restaurant_max_pages(),
            patience: default_patience(),
            brand_length_slack: default_brand_length_slack(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            source_label: default_source_label(),
        }
    }
}

impl ApiConfig {
    /// Builds an API section with explicit credentials and default settings
    pub fn with_credentials(endpoint: &str, consumer_key: &str, consumer_secret: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            consumer_key: Some(consumer_key.to_string()),
            consumer_secret: Some(consumer_secret.to_string()),
            consumer_key_env: default_key_env(),
            consumer_secret_env: default_secret_env(),
            page_size: default_page_size(),
        }
    }

    /// Returns the resolved consumer key, or an empty string if unresolved
    pub fn key(&self) -> &str {
        self.consumer_key.as_deref().unwrap_or("")
    }

    /// Returns the resolved consumer secret, or an empty string if unresolved
    pub fn secret(&self) -> &str {
        self.consumer_secret.as_deref().unwrap_or("")
    }
}
