//! Integration tests for a full harvest run
//!
//! These tests use wiremock to stand in for the signed search endpoint and
//! drive `run_harvest` end-to-end against a temporary catalog directory.

use food_harvest::catalog::{StopReason, AGGREGATE_FILE, LOG_FILE};
use food_harvest::config::{
    ApiConfig, BudgetConfig, ClientConfig, Config, DiscoveryConfig, ExtractionConfig,
    OutputConfig,
};
use food_harvest::{run_harvest, HarvestError, RunPhase};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT_PATH: &str = "/rest/server.api";

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, catalog_dir: &Path, seeds: &[&str]) -> Config {
    Config {
        api: ApiConfig::with_credentials(
            &format!("{}{}", server.uri(), ENDPOINT_PATH),
            "test-consumer-key",
            "test-consumer-secret",
        ),
        client: ClientConfig {
            min_delay_ms: 0,
            retry_attempts: 2,
            retry_delay_ms: 10, // Very short for testing
            request_timeout_ms: 2000,
            user_agent: "food-harvest-test/1.0".to_string(),
        },
        budget: BudgetConfig {
            ceiling: 100,
            safety_margin: 0,
        },
        discovery: DiscoveryConfig {
            max_pages_per_term: 30,
            seed_terms: seeds.iter().map(|s| s.to_string()).collect(),
            use_brand_catalog: false,
            permissive_restaurants: false,
        },
        extraction: ExtractionConfig::default(),
        output: OutputConfig {
            catalog_dir: catalog_dir.to_string_lossy().to_string(),
            source_label: "Test Food Database".to_string(),
        },
    }
}

fn row(id: &str, name: &str, brand: Option<&str>) -> Value {
    let mut row = json!({
        "food_id": id,
        "food_name": name,
        "food_description": "Per 100g - Calories: 100kcal",
        "food_url": format!("https://foods.example/{}", id),
        "food_type": if brand.is_some() { "Brand" } else { "Generic" },
    });
    if let Some(brand) = brand {
        row["brand_name"] = json!(brand);
    }
    row
}

fn search_body(total: u64, rows: Vec<Value>) -> Value {
    json!({
        "foods_search": {
            "max_results": "50",
            "total_results": total.to_string(),
            "page_number": "0",
            "results": { "food": rows }
        }
    })
}

/// Mounts a search response for one expression
async fn mount_search(server: &MockServer, expression: &str, total: u64, rows: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains(format!("search_expression={}", expression)))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(total, rows)))
        .mount(server)
        .await;
}

/// Mounts the authentication canary
async fn mount_canary(server: &MockServer) {
    mount_search(server, "apple", 1, vec![row("100", "Apple", None)]).await;
}

/// Counts received requests whose form body contains `needle`
async fn requests_containing(server: &MockServer, needle: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains(needle))
        .count()
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("Failed to read catalog file");
    serde_json::from_str(&text).expect("Catalog file is not valid JSON")
}

/// Mounts the cheese scenario: one seed, one brand, three category tokens
async fn mount_cheese(server: &MockServer) {
    mount_canary(server).await;
    mount_search(
        server,
        "cheese",
        3,
        vec![
            row("1", "Cheddar Cheese", None),
            row("2", "Block Cheese", Some("Kraft")),
            row("3", "Generic Cheese", Some("Generic")),
        ],
    )
    .await;
    mount_search(
        server,
        "Kraft",
        2,
        vec![
            row("2", "Block Cheese", Some("Kraft")),
            row("4", "Ketchup", Some("Heinz")),
        ],
    )
    .await;
    mount_search(server, "block", 1, vec![row("2", "Block Cheese", Some("Kraft"))]).await;
    mount_search(server, "cheddar", 1, vec![row("1", "Cheddar Cheese", None)]).await;
}

#[tokio::test]
async fn test_full_run_writes_catalog() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let config = create_test_config(&mock_server, &root, &["cheese"]);

    let report = run_harvest(config, "test-hash".to_string(), false)
        .await
        .expect("Run failed");

    assert_eq!(report.phase, RunPhase::Done);
    assert!(!report.terminated_early);
    assert_eq!(report.discovered.foods, 3);
    assert_eq!(report.discovered.brands, 1);
    assert_eq!(report.discovered.categories, 3);
    assert_eq!(report.files_written, 4);
    // canary, cheese discovery, Kraft, block, cheddar, cheese category
    assert_eq!(report.requests_used, 6);

    // Brand file keeps only Kraft-labelled items
    let kraft = read_json(&root.join("brands/kraft.json"));
    assert_eq!(kraft["brand_name"], "Kraft");
    assert_eq!(kraft["total_items"], 1);
    assert_eq!(kraft["items"][0]["food_id"], "2");
    assert_eq!(kraft["source"], "Test Food Database");
    assert_eq!(kraft["stop_reason"], "remote_exhausted");
    assert!(kraft["items"][0].get("discovered_via").is_none());

    // Category files are unfiltered first pages
    let cheese = read_json(&root.join("categories/cheese.json"));
    assert_eq!(cheese["category"], "cheese");
    assert_eq!(cheese["total_items"], 3);
    assert!(!root.join("categories/generic.json").exists());

    let aggregate = read_json(&root.join(AGGREGATE_FILE));
    assert_eq!(aggregate["total_foods_discovered"], 3);
    assert_eq!(aggregate["new_foods_discovered"], 3);
    assert_eq!(aggregate["api_requests_used"], 6);
    assert_eq!(aggregate["discovered_brands"], json!(["Kraft"]));
    assert_eq!(aggregate["discovered_categories"], json!(["block", "cheddar", "cheese"]));
    assert_eq!(aggregate["foods"][0]["discovered_via"], "cheese");
    assert_eq!(aggregate["extraction_results"]["brands"]["Kraft"], 1);

    let log = read_json(&root.join(LOG_FILE));
    assert_eq!(log["config_hash"], "test-hash");
    assert_eq!(log["requests_used"], 6);
    assert_eq!(log["terminated_early"], false);
    assert_eq!(log["extractions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_requests_are_signed_form_posts() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &temp_dir.path().join("catalog"), &["cheese"]);
    run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(!requests.is_empty());

    for request in &requests {
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("method=foods.search.v3"));
        assert!(body.contains("format=json"));
        assert!(body.contains("oauth_consumer_key=test-consumer-key"));
        assert!(body.contains("oauth_signature_method=HMAC-SHA1"));
        assert!(body.contains("oauth_signature="));
        assert!(!body.contains("test-consumer-secret"));
    }
}

#[tokio::test]
async fn test_second_run_skips_persisted_entities() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &temp_dir.path().join("catalog"), &["cheese"]);

    run_harvest(config.clone(), "h".to_string(), false)
        .await
        .expect("First run failed");
    assert_eq!(requests_containing(&mock_server, "search_expression=Kraft").await, 1);

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Second run failed");

    assert_eq!(report.files_written, 0);
    assert_eq!(report.new_foods, 0);
    assert!(report.outcomes.is_empty());
    // Only the canary and the discovery page were requested again
    assert_eq!(report.requests_used, 2);
    assert_eq!(requests_containing(&mock_server, "search_expression=Kraft").await, 1);
}

#[tokio::test]
async fn test_fresh_run_re_extracts() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &temp_dir.path().join("catalog"), &["cheese"]);

    run_harvest(config.clone(), "h".to_string(), false)
        .await
        .expect("First run failed");
    let report = run_harvest(config, "h".to_string(), true)
        .await
        .expect("Fresh run failed");

    assert_eq!(report.files_written, 4);
    assert_eq!(report.new_foods, 3);
    assert_eq!(requests_containing(&mock_server, "search_expression=Kraft").await, 2);
}

#[tokio::test]
async fn test_auth_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 8, "message": "Invalid signature" }
        })))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let config = create_test_config(&mock_server, &root, &["cheese"]);

    let result = run_harvest(config, "h".to_string(), false).await;

    assert!(matches!(result, Err(HarvestError::AuthenticationFailed(_))));
    // Remote errors are not retried
    assert_eq!(requests_containing(&mock_server, "search_expression=apple").await, 1);
    assert!(!root.join(AGGREGATE_FILE).exists());
    assert!(!root.join(LOG_FILE).exists());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;
    mount_canary(&mock_server).await;
    mount_search(
        &mock_server,
        "ketchup",
        1,
        vec![row("7", "Tomato Ketchup", Some("Heinz"))],
    )
    .await;

    // First Heinz attempt fails, the retry succeeds
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("search_expression=Heinz"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_search(
        &mock_server,
        "Heinz",
        1,
        vec![row("7", "Tomato Ketchup", Some("Heinz"))],
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["ketchup"]);
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    assert_eq!(report.files_written, 1);
    // canary, ketchup, two Heinz attempts
    assert_eq!(report.requests_used, 4);
    let heinz = read_json(&root.join("brands/heinz.json"));
    assert_eq!(heinz["total_items"], 1);
}

/// Mounts the canary and a "ketchup" seed that surfaces the Heinz brand
async fn mount_ketchup(server: &MockServer) {
    mount_canary(server).await;
    mount_search(
        server,
        "ketchup",
        1,
        vec![row("7", "Tomato Ketchup", Some("Heinz"))],
    )
    .await;
}

#[tokio::test]
async fn test_timed_out_request_is_retried() {
    let mock_server = MockServer::start().await;
    mount_ketchup(&mock_server).await;

    // First Heinz attempt answers after the client has given up
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("search_expression=Heinz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(1, vec![row("7", "Tomato Ketchup", Some("Heinz"))]))
                .set_delay(Duration::from_millis(1500)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_search(
        &mock_server,
        "Heinz",
        1,
        vec![row("7", "Tomato Ketchup", Some("Heinz"))],
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["ketchup"]);
    config.client.request_timeout_ms = 300;
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    // canary, ketchup, timed-out Heinz attempt, successful retry
    assert_eq!(report.requests_used, 4);
    assert_eq!(requests_containing(&mock_server, "search_expression=Heinz").await, 2);
    assert_eq!(report.files_written, 1);
    assert_eq!(report.outcomes[0].stop_reason, StopReason::RemoteExhausted);
    let heinz = read_json(&root.join("brands/heinz.json"));
    assert_eq!(heinz["total_items"], 1);
}

#[tokio::test]
async fn test_non_json_body_is_retried_then_no_data() {
    let mock_server = MockServer::start().await;
    mount_ketchup(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("search_expression=Heinz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Service Unavailable</html>"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["ketchup"]);
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    // Both configured attempts were spent on Heinz
    assert_eq!(requests_containing(&mock_server, "search_expression=Heinz").await, 2);
    assert_eq!(report.requests_used, 4);
    assert_eq!(report.files_written, 0);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].stop_reason, StopReason::NoData);
    assert!(!root.join("brands/heinz.json").exists());
}

#[tokio::test]
async fn test_remote_error_yields_no_entity() {
    let mock_server = MockServer::start().await;
    mount_canary(&mock_server).await;
    mount_search(
        &mock_server,
        "ketchup",
        1,
        vec![row("7", "Tomato Ketchup", Some("Heinz"))],
    )
    .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("search_expression=Heinz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 12, "message": "User is performing too many actions" }
        })))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["ketchup"]);
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    assert_eq!(report.files_written, 0);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].stop_reason, StopReason::NoData);
    assert!(!report.outcomes[0].persisted);
    assert_eq!(requests_containing(&mock_server, "search_expression=Heinz").await, 1);
    assert!(!root.join("brands/heinz.json").exists());
}

#[tokio::test]
async fn test_discovery_pages_through_results() {
    let mock_server = MockServer::start().await;
    mount_canary(&mock_server).await;

    for (page, rows) in [
        (0, vec![row("1", "Rye Bread", None), row("2", "Wheat Bread", None)]),
        (1, vec![row("3", "Sourdough Bread", None)]),
    ] {
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(body_string_contains(format!(
                "page_number={}&search_expression=bread",
                page
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(3, rows)))
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["bread"]);
    config.api.page_size = 2;
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    assert_eq!(report.discovered.foods, 3);
    assert_eq!(requests_containing(&mock_server, "search_expression=bread").await, 2);

    let aggregate = read_json(&root.join(AGGREGATE_FILE));
    assert_eq!(aggregate["foods"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_budget_margin_persists_early() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["cheese"]);
    config.budget = BudgetConfig {
        ceiling: 4,
        safety_margin: 2,
    };

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Budget-terminated runs still succeed");

    assert_eq!(report.phase, RunPhase::Done);
    assert!(report.terminated_early);
    assert_eq!(report.files_written, 0);
    assert_eq!(report.requests_used, 2);
    assert_eq!(requests_containing(&mock_server, "search_expression=Kraft").await, 0);

    let log = read_json(&root.join(LOG_FILE));
    assert_eq!(log["terminated_early"], true);
    assert_eq!(log["request_ceiling"], 4);
    assert!(root.join(AGGREGATE_FILE).exists());
}

#[tokio::test]
async fn test_brand_catalog_seeds_brands() {
    let mock_server = MockServer::start().await;
    mount_cheese(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("method=food_brands.get.v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "food_brands": { "food_brand": ["Heinz", "Kraft"] }
        })))
        .mount(&mock_server)
        .await;
    mount_search(&mock_server, "Heinz", 1, vec![row("4", "Ketchup", Some("Heinz"))]).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("catalog");
    let mut config = create_test_config(&mock_server, &root, &["cheese"]);
    config.discovery.use_brand_catalog = true;
    config.extraction.max_categories = 0;

    let report = run_harvest(config, "h".to_string(), false)
        .await
        .expect("Run failed");

    assert_eq!(report.discovered.brands, 2);
    assert_eq!(report.files_written, 2);
    assert!(root.join("brands/heinz.json").exists());
    assert!(root.join("brands/kraft.json").exists());
}
