//! Signed request client
//!
//! This module handles every remote call, including:
//! - Building the HTTP client with timeouts and user agent
//! - Charging the shared request budget before transmission
//! - Waiting on the rate gate between sends
//! - Signing each attempt with a fresh nonce and timestamp
//! - Retrying transient failures with a fixed delay
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Timeout | Retry, fixed delay |
//! | Connection error | Retry, fixed delay |
//! | HTTP non-2xx | Retry, fixed delay |
//! | Body is not JSON | Retry, fixed delay |
//! | JSON `error` object | No retry, no data |
//! | Budget ceiling reached | No send, no data |

use crate::client::budget::RequestBudget;
use crate::client::gate::RateGate;
use crate::client::signing::{encode_form, signed_params, Credentials, Freshness};
use crate::config::{ApiConfig, ClientConfig};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Why a single attempt produced no usable response
#[derive(Debug)]
pub enum SendFailure {
    /// The request exceeded the per-request timeout
    Timeout,

    /// Connection-level failure (refused, reset, DNS)
    Network(String),

    /// The endpoint answered with a non-success status
    HttpStatus(u16),

    /// The body could not be decoded as JSON
    Decode(String),
}

impl std::fmt::Display for SendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timeout"),
            Self::Network(e) => write!(f, "network error: {}", e),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Decode(e) => write!(f, "invalid JSON body: {}", e),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client configuration (timeout and user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(config.request_timeout_ms);

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Authenticated, budgeted, rate-limited client for the remote API
pub struct SignedClient {
    http: Client,
    endpoint: String,
    credentials: Credentials,
    budget: Arc<RequestBudget>,
    gate: RateGate,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl SignedClient {
    /// Creates a client from the `[api]` and `[client]` configuration sections
    pub fn new(
        api: &ApiConfig,
        config: &ClientConfig,
        budget: Arc<RequestBudget>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(config)?,
            endpoint: api.endpoint.clone(),
            credentials: Credentials {
                consumer_key: api.key().to_string(),
                consumer_secret: api.secret().to_string(),
            },
            budget,
            gate: RateGate::new(Duration::from_millis(config.min_delay_ms)),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Sends one remote procedure call
    ///
    /// Each attempt is charged to the budget before it is transmitted. After
    /// the final failed attempt the call yields `None`, which callers treat as
    /// an empty page.
    ///
    /// # Arguments
    ///
    /// * `procedure` - Remote procedure name (e.g. `foods.search.v3`)
    /// * `params` - Flat procedure parameters
    ///
    /// # Returns
    ///
    /// * `Some(Value)` - The decoded JSON response
    /// * `None` - No data (retries exhausted, remote error, or budget ceiling)
    pub async fn send(&self, procedure: &str, params: &[(&str, String)]) -> Option<Value> {
        for attempt in 1..=self.retry_attempts {
            if !self.budget.try_issue() {
                tracing::warn!(
                    "Request ceiling of {} reached, not sending {}",
                    self.budget.ceiling(),
                    procedure
                );
                return None;
            }

            self.gate.wait().await;

            match self.transmit(procedure, params).await {
                Ok(value) => {
                    if let Some(error) = value.get("error") {
                        tracing::warn!("Remote error for {}: {}", procedure, error);
                        return None;
                    }
                    return Some(value);
                }
                Err(failure) => {
                    tracing::warn!(
                        "Request error for {} (attempt {}/{}): {}",
                        procedure,
                        attempt,
                        self.retry_attempts,
                        failure
                    );
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        None
    }

    /// Signs and posts a single attempt
    async fn transmit(&self, procedure: &str, params: &[(&str, String)]) -> Result<Value, SendFailure> {
        let signed = signed_params(
            &self.credentials,
            &self.endpoint,
            procedure,
            params,
            &Freshness::generate(),
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(encode_form(&signed))
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendFailure::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_error)?;

        serde_json::from_str(&body).map_err(|e| SendFailure::Decode(e.to_string()))
    }
}

/// Maps a reqwest error onto the transient failure taxonomy
fn classify_error(e: reqwest::Error) -> SendFailure {
    if e.is_timeout() {
        SendFailure::Timeout
    } else {
        SendFailure::Network(e.to_string())
    }
}
