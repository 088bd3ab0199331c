//! Shared helpers for the Bitstamp integration tests
#![allow(dead_code)]

use bitstamp::exchanges::bitstamp::build_client;
use bitstamp::{BitstampRestClient, ClientConfig};
use bitstamp::core::kernel::ReqwestRest;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const SECRET_KEY: &str = "test-secret-key";
pub const NONCE: &str = "f93c979d-b00d-43a9-9b9c-fd4cd9547fa6";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api` prefix with a fixed nonce
pub fn test_client(server: &MockServer) -> BitstampRestClient<ReqwestRest> {
    build_client(test_config(server)).expect("client should build")
}

pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY.to_string(), SECRET_KEY.to_string())
        .base_url(format!("{}/api", server.uri()))
        .nonce_generator(Arc::new(|| NONCE.to_string()))
}

pub fn hmac_hex(secret: &str, message: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("any key length works");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn header<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Plays the server side of X-Auth v2.
///
/// Checks `X-Auth-Signature` against its own recomputation and answers with
/// a body signed through `X-Server-Auth-Signature`. A bad request signature
/// is answered like the real API does, with a 403 `code`/`reason` body.
pub struct SigningResponder {
    authority: String,
    status: u16,
    body: String,
    tamper: bool,
}

impl SigningResponder {
    pub fn new(server: &MockServer, body: impl Into<String>) -> Self {
        Self {
            authority: server
                .uri()
                .trim_start_matches("http://")
                .to_string(),
            status: 200,
            body: body.into(),
            tamper: false,
        }
    }

    pub fn json(server: &MockServer, body: serde_json::Value) -> Self {
        Self::new(server, body.to_string())
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sign something other than the body that is actually sent
    pub fn tampered(mut self) -> Self {
        self.tamper = true;
        self
    }

    fn expected_signature(&self, request: &Request) -> String {
        let mut url = format!("{}{}", self.authority, request.url.path());
        if let Some(query) = request.url.query() {
            url.push('?');
            url.push_str(query);
        }

        let nonce = header(request, "X-Auth-Nonce");
        let timestamp = header(request, "X-Auth-Timestamp");
        let payload = String::from_utf8_lossy(&request.body);
        let mut message = format!("BITSTAMP {}{}{}", API_KEY, request.method, url);
        if payload.is_empty() {
            message.push_str(&format!("{}{}v2", nonce, timestamp));
        } else {
            message.push_str(&format!(
                "{}{}{}v2{}",
                header(request, "Content-Type"),
                nonce,
                timestamp,
                payload
            ));
        }
        hmac_hex(SECRET_KEY, message.as_bytes())
    }
}

impl Respond for SigningResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if header(request, "X-Auth-Signature") != self.expected_signature(request)
            || header(request, "X-Auth") != format!("BITSTAMP {}", API_KEY)
            || header(request, "X-Auth-Version") != "v2"
        {
            return ResponseTemplate::new(403).set_body_raw(
                r#"{"status": "error", "reason": "Invalid signature", "code": "API0005"}"#,
                "application/json",
            );
        }

        let signed_body = if self.tamper {
            format!("{} ", self.body)
        } else {
            self.body.clone()
        };
        let server_signature = hmac_hex(
            SECRET_KEY,
            format!(
                "{}{}application/json{}",
                header(request, "X-Auth-Nonce"),
                header(request, "X-Auth-Timestamp"),
                signed_body
            )
            .as_bytes(),
        );

        ResponseTemplate::new(self.status)
            .insert_header("X-Server-Auth-Signature", server_signature.as_str())
            .set_body_raw(self.body.clone(), "application/json")
    }
}
