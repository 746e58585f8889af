//! OAuth 1.0 request signing (HMAC-SHA1, two-legged)
//!
//! # Signature
//!
//! 1. Collect every request parameter except `oauth_signature`
//! 2. Sort by key, percent-encode keys and values, join `key=value` with `&`
//! 3. Base string: `METHOD&enc(url)&enc(sorted params)`
//! 4. HMAC-SHA1 over the base string keyed with `enc(consumer_secret)&`
//! 5. Base64 the digest and append it as `oauth_signature`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

/// HTTP method every remote call is signed for
pub const HTTP_METHOD: &str = "POST";

/// Consumer credentials for the remote API
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// Per-request freshness values of the auth envelope
#[derive(Debug, Clone)]
pub struct Freshness {
    pub nonce: String,
    pub timestamp: i64,
}

impl Freshness {
    /// Generates a random 32-hex-character nonce and the current Unix time
    pub fn generate() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Percent-encodes a string using the RFC 3986 unreserved set
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Joins sorted parameters as `enc(key)=enc(value)` pairs separated by `&`
pub fn normalized_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the signature base string
pub fn signature_base_string(method: &str, url: &str, params: &BTreeMap<String, String>) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized_params(params))
    )
}

/// Computes the base64 HMAC-SHA1 signature with an empty token secret
pub fn sign(base_string: &str, consumer_secret: &str) -> String {
    let signing_key = format!("{}&", percent_encode(consumer_secret));

    let mut mac =
        HmacSha1::new_from_slice(signing_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base_string.as_bytes());

    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the complete, signed parameter set for one remote procedure call
///
/// # Arguments
///
/// * `credentials` - Consumer key and secret
/// * `url` - The endpoint the request is posted to
/// * `procedure` - Remote procedure name (e.g. `foods.search.v3`)
/// * `params` - Procedure parameters
/// * `freshness` - Nonce and timestamp for this attempt
pub fn signed_params(
    credentials: &Credentials,
    url: &str,
    procedure: &str,
    params: &[(&str, String)],
    freshness: &Freshness,
) -> BTreeMap<String, String> {
    let mut all: BTreeMap<String, String> = params
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();

    all.insert("method".to_string(), procedure.to_string());
    all.insert("format".to_string(), "json".to_string());
    all.insert(
        "oauth_consumer_key".to_string(),
        credentials.consumer_key.clone(),
    );
    all.insert("oauth_nonce".to_string(), freshness.nonce.clone());
    all.insert(
        "oauth_signature_method".to_string(),
        "HMAC-SHA1".to_string(),
    );
    all.insert(
        "oauth_timestamp".to_string(),
        freshness.timestamp.to_string(),
    );
    all.insert("oauth_version".to_string(), "1.0".to_string());

    let base = signature_base_string(HTTP_METHOD, url, &all);
    let signature = sign(&base, &credentials.consumer_secret);
    all.insert("oauth_signature".to_string(), signature);

    all
}

/// Encodes parameters as an `application/x-www-form-urlencoded` body
pub fn encode_form(params: &BTreeMap<String, String>) -> String {
    normalized_params(params)
}
