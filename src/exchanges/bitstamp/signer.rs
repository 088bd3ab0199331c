use crate::core::errors::BitstampError;
use crate::core::kernel::signer::{hmac_sha256_hex, new_mac, SignatureResult, SignedRequestContext};
use crate::core::kernel::Signer;
use hmac::Mac;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

pub const AUTH_VERSION: &str = "v2";
pub const SERVER_SIGNATURE_HEADER: &str = "X-Server-Auth-Signature";

/// X-Auth v2 signer.
///
/// The request signature covers the method, the URL without its scheme, the
/// nonce, the timestamp and the payload. The server signs its answer with the
/// same secret over nonce, timestamp, content type and body.
pub struct BitstampSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl BitstampSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// Value of the `X-Auth` header
    pub fn x_auth(&self) -> String {
        format!("BITSTAMP {}", self.api_key.expose_secret())
    }

    /// The exact text covered by `X-Auth-Signature`.
    pub fn canonical_message(&self, ctx: &SignedRequestContext<'_>) -> String {
        let url = ctx
            .url
            .strip_prefix("https://")
            .or_else(|| ctx.url.strip_prefix("http://"))
            .unwrap_or(ctx.url);

        let mut message = format!("{}{}{}", self.x_auth(), ctx.method, url);
        if ctx.payload.is_empty() {
            message.push_str(ctx.nonce);
            message.push_str(ctx.timestamp);
            message.push_str(AUTH_VERSION);
        } else {
            message.push_str(ctx.content_type);
            message.push_str(ctx.nonce);
            message.push_str(ctx.timestamp);
            message.push_str(AUTH_VERSION);
            message.push_str(ctx.payload);
        }
        message
    }

    /// Lowercase hex HMAC-SHA256 of [`canonical_message`](Self::canonical_message).
    pub fn sign(&self, ctx: &SignedRequestContext<'_>) -> Result<String, BitstampError> {
        let message = self.canonical_message(ctx);
        hmac_sha256_hex(self.secret_key.expose_secret().as_bytes(), &[message.as_bytes()])
    }

    /// Constant-time check of the server's response signature.
    ///
    /// `claimed` is compared as hex, so its case does not matter. Anything
    /// that does not decode or does not match is a
    /// [`BitstampError::SignatureMismatch`].
    pub fn verify_server_signature(
        &self,
        nonce: &str,
        timestamp: &str,
        content_type: &str,
        body: &[u8],
        claimed: &str,
    ) -> Result<(), BitstampError> {
        let mut mac = new_mac(self.secret_key.expose_secret().as_bytes())?;
        mac.update(nonce.as_bytes());
        mac.update(timestamp.as_bytes());
        mac.update(content_type.as_bytes());
        mac.update(body);
        let expected = mac.clone();

        let verified = hex::decode(claimed)
            .map(|bytes| mac.verify_slice(&bytes).is_ok())
            .unwrap_or(false);
        if verified {
            return Ok(());
        }

        Err(BitstampError::SignatureMismatch {
            expected: hex::encode(expected.finalize().into_bytes()),
            received: claimed.to_string(),
        })
    }
}

impl Signer for BitstampSigner {
    fn sign_request(&self, ctx: &SignedRequestContext<'_>) -> SignatureResult {
        let signature = self.sign(ctx)?;

        let mut headers = HashMap::new();
        headers.insert("X-Auth".to_string(), self.x_auth());
        headers.insert("X-Auth-Signature".to_string(), signature);
        headers.insert("X-Auth-Nonce".to_string(), ctx.nonce.to_string());
        headers.insert("X-Auth-Timestamp".to_string(), ctx.timestamp.to_string());
        headers.insert("X-Auth-Version".to_string(), AUTH_VERSION.to_string());

        Ok((headers, Vec::new()))
    }

    fn verify_response(
        &self,
        ctx: &SignedRequestContext<'_>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), BitstampError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let claimed = headers
            .get(SERVER_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        self.verify_server_signature(ctx.nonce, ctx.timestamp, content_type, body, claimed)
    }
}

/// Form-credential signer used before X-Auth existed.
///
/// Adds `key`, `signature` and `nonce` fields to the form body, where the
/// signature is the uppercase hex HMAC-SHA256 of nonce + customer id + key.
pub struct LegacySigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
    customer_id: String,
}

impl LegacySigner {
    pub fn new(api_key: String, secret_key: String, customer_id: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            customer_id,
        }
    }

    pub fn signature(&self, nonce: &str) -> Result<String, BitstampError> {
        let hex = hmac_sha256_hex(
            self.secret_key.expose_secret().as_bytes(),
            &[
                nonce.as_bytes(),
                self.customer_id.as_bytes(),
                self.api_key.expose_secret().as_bytes(),
            ],
        )?;
        Ok(hex.to_uppercase())
    }
}

impl Signer for LegacySigner {
    fn sign_request(&self, ctx: &SignedRequestContext<'_>) -> SignatureResult {
        let params = vec![
            ("key".to_string(), self.api_key.expose_secret().clone()),
            ("signature".to_string(), self.signature(ctx.nonce)?),
            ("nonce".to_string(), ctx.nonce.to_string()),
        ];
        Ok((HashMap::new(), params))
    }

    // form-credential responses carry no server signature
    fn verify_response(
        &self,
        _ctx: &SignedRequestContext<'_>,
        _headers: &HeaderMap,
        _body: &[u8],
    ) -> Result<(), BitstampError> {
        Ok(())
    }
}
