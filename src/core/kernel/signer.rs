use crate::core::errors::BitstampError;
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use sha2::Sha256;
use std::collections::HashMap;

pub type HmacSha256 = Hmac<Sha256>;

/// Result type for signing operations: (headers, `credential_params`)
///
/// Header based schemes return an empty parameter list. Form-credential
/// schemes return no headers and the fields to merge into the form body.
pub type SignatureResult = Result<(HashMap<String, String>, Vec<(String, String)>), BitstampError>;

/// Everything a signer may use for one outbound request.
///
/// Built once per call. The same nonce and timestamp are later used to check
/// the server's signature over the response.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequestContext<'a> {
    pub method: &'a str,
    /// Fully merged URL including the query string.
    pub url: &'a str,
    pub content_type: &'a str,
    /// Exact body bytes that go on the wire, empty when there is no body.
    pub payload: &'a str,
    pub nonce: &'a str,
    pub timestamp: &'a str,
}

/// Signer trait for request authentication
pub trait Signer: Send + Sync {
    /// Sign a request and return headers and credential parameters
    fn sign_request(&self, ctx: &SignedRequestContext<'_>) -> SignatureResult;

    /// Check the server's signature over a successful response.
    ///
    /// Must fail closed: a missing or wrong signature is an error.
    fn verify_response(
        &self,
        ctx: &SignedRequestContext<'_>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), BitstampError>;
}

pub(crate) fn new_mac(secret: &[u8]) -> Result<HmacSha256, BitstampError> {
    HmacSha256::new_from_slice(secret)
        .map_err(|e| BitstampError::AuthError(format!("Invalid secret key: {}", e)))
}

/// Lowercase hex HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256_hex(secret: &[u8], parts: &[&[u8]]) -> Result<String, BitstampError> {
    let mut mac = new_mac(secret)?;
    for part in parts {
        mac.update(part);
    }
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Default nonce: a random UUID v4 (36 characters).
pub fn default_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch in UTC, as sent in `X-Auth-Timestamp`.
pub fn timestamp_millis() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
