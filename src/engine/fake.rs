//! In-memory search source for engine tests

use crate::client::{BrandCatalog, RawResult, RequestBudget, SearchPage, SearchSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Builds a search row
pub fn food(id: &str, name: &str, label: Option<&str>) -> RawResult {
    RawResult {
        food_id: id.to_string(),
        food_name: name.to_string(),
        food_description: format!("Per serving - {}", name),
        food_url: format!("https://foods.example/{}", id),
        brand_name: label.map(str::to_string),
        food_type: if label.is_some() { "Brand" } else { "Generic" }.to_string(),
    }
}

/// Serves canned pages keyed by (expression, page number)
pub struct FakeSource {
    page_size: u32,
    pages: HashMap<(String, u32), SearchPage>,
    budget: Option<Arc<RequestBudget>>,
    probe_ok: bool,
    brands: Option<BrandCatalog>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSource {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            pages: HashMap::new(),
            budget: None,
            probe_ok: true,
            brands: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Charges every page request against `budget`, refusing at the ceiling
    pub fn with_budget(mut self, budget: Arc<RequestBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_ok = false;
        self
    }

    pub fn with_brand_catalog(mut self, catalog: BrandCatalog) -> Self {
        self.brands = Some(catalog);
        self
    }

    /// Registers one page of results for an expression
    pub fn add_page(&mut self, expression: &str, page_number: u32, items: Vec<RawResult>, total: u64) {
        let page = SearchPage {
            rows: items.len(),
            items,
            total_remote_count: total,
            page_number,
            page_size: self.page_size,
        };
        self.pages.insert((expression.to_string(), page_number), page);
    }

    /// Returns every (expression, page) requested so far, in order
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the pages requested for one expression
    pub fn pages_requested(&self, expression: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(e, _)| e == expression)
            .map(|(_, page)| page)
            .collect()
    }
}

#[async_trait]
impl SearchSource for FakeSource {
    async fn search_page(&self, expression: &str, page_number: u32) -> Option<SearchPage> {
        if let Some(budget) = &self.budget {
            if !budget.try_issue() {
                return None;
            }
        }

        self.calls
            .lock()
            .unwrap()
            .push((expression.to_string(), page_number));

        self.pages
            .get(&(expression.to_string(), page_number))
            .cloned()
    }

    async fn probe(&self) -> bool {
        self.probe_ok
    }

    async fn brand_catalog(&self) -> Option<BrandCatalog> {
        self.brands.clone()
    }
}
