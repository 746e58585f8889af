//! Remote API client module
//!
//! This module contains everything that talks to the remote food API:
//! - OAuth 1.0 request signing
//! - The shared request budget and the minimum-delay rate gate
//! - Signed sends with retry and timeout handling
//! - The paginated search protocol and brand catalog decoding

mod brands;
mod budget;
mod gate;
mod search;
mod signed;
mod signing;

pub use brands::BrandCatalog;
pub use budget::RequestBudget;
pub use gate::RateGate;
pub use search::{
    decode_search_page, RawResult, SearchClient, SearchPage, SearchSource, BRAND_CATALOG_METHOD,
    PROBE_TERM, SEARCH_METHOD,
};
pub use signed::{build_http_client, SendFailure, SignedClient};
pub use signing::{signed_params, Credentials, Freshness};
