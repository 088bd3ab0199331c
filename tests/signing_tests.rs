use bitstamp::core::kernel::{url_merge, RequestBody, SignedRequestContext};
use bitstamp::exchanges::bitstamp::{BitstampSigner, LegacySigner};
use reqwest::Url;
use serde_json::json;

const NONCE: &str = "f93c979d-b00d-43a9-9b9c-fd4cd9547fa6";
const TIMESTAMP: &str = "1567755304968";

fn signer() -> BitstampSigner {
    BitstampSigner::new("api-key".to_string(), "secret".to_string())
}

fn base() -> Url {
    Url::parse("https://www.bitstamp.net/api").unwrap()
}

fn context<'a>(method: &'a str, url: &'a str, content_type: &'a str, payload: &'a str) -> SignedRequestContext<'a> {
    SignedRequestContext {
        method,
        url,
        content_type,
        payload,
        nonce: NONCE,
        timestamp: TIMESTAMP,
    }
}

#[test]
fn test_known_vector_without_payload() {
    let url = url_merge(&base(), "/v2/balance/", &[]);
    let (content_type, payload) = RequestBody::Empty.encode().unwrap();
    let signature = signer()
        .sign(&context("POST", &url, content_type, &payload))
        .unwrap();
    assert_eq!(
        signature,
        "a5190ba3f2884abe3f1f4917cb86221cca13459ea44adef4242e081e4612a376"
    );
}

#[test]
fn test_known_vector_with_form_payload() {
    let url = url_merge(&base(), "/v2/user_transactions/", &[]);
    let (content_type, payload) = RequestBody::form(&[("offset", "0"), ("limit", "1000")])
        .encode()
        .unwrap();
    assert_eq!(payload, "limit=1000&offset=0");
    let signature = signer()
        .sign(&context("POST", &url, content_type, &payload))
        .unwrap();
    assert_eq!(
        signature,
        "c873e3209cea52a9415ffaaa97c009f7eb9340f5392ea6d93c9061d9a3ad45f7"
    );
}

#[test]
fn test_known_vector_with_query() {
    let url = url_merge(
        &base(),
        "/v2/leverage_settings/",
        &[("market", "BTC/USD-PERP"), ("margin_mode", "CROSS")],
    );
    assert_eq!(
        url,
        "https://www.bitstamp.net/api/v2/leverage_settings/?margin_mode=CROSS&market=BTC%2FUSD-PERP"
    );
    let (content_type, payload) = RequestBody::Json(serde_json::Value::Null).encode().unwrap();
    assert!(payload.is_empty());
    let signature = signer()
        .sign(&context("GET", &url, content_type, &payload))
        .unwrap();
    assert_eq!(
        signature,
        "1e0da3595409f03b18ec550eff0ad416a20dc7104bed254d142b65a107095cd9"
    );
}

#[test]
fn test_known_vector_with_json_payload() {
    let url = url_merge(&base(), "/v2/close_position/", &[]);
    let (content_type, payload) = RequestBody::Json(json!({"position_id": "p-1"}))
        .encode()
        .unwrap();
    assert_eq!(content_type, "application/json");
    let signature = signer()
        .sign(&context("POST", &url, content_type, &payload))
        .unwrap();
    assert_eq!(
        signature,
        "b9e60c463ca8ff121c5384b1f8791b48d726abc6010714726cb942a5544891ef"
    );
}

#[test]
fn test_known_server_signature() {
    let body = br#"{"token":"abc"}"#;
    let claimed = "942b9f1d839d5e4fcf7912a8403ce0d3ec0481dc2756d17e06c23c73e0234f81";
    assert!(signer()
        .verify_server_signature(NONCE, TIMESTAMP, "application/json", body, claimed)
        .is_ok());
    assert!(signer()
        .verify_server_signature(NONCE, TIMESTAMP, "text/html", body, claimed)
        .is_err());
    assert!(signer()
        .verify_server_signature(NONCE, "1567755304969", "application/json", body, claimed)
        .is_err());
}

#[test]
fn test_known_legacy_signature() {
    let signer = LegacySigner::new(
        "api-key".to_string(),
        "secret".to_string(),
        "123456".to_string(),
    );
    assert_eq!(
        signer.signature("1000").unwrap(),
        "A198136248500860CC74472131B24929529377DB77FCA33A8133B272C378587A"
    );
}

#[test]
fn test_url_merge_examples() {
    let local = Url::parse("http://127.0.0.1:9876").unwrap();
    assert_eq!(
        url_merge(&local, "api/v2/ticker/", &[("t", "asdf"), ("q", "3")]),
        "http://127.0.0.1:9876/api/v2/ticker/?q=3&t=asdf"
    );
    assert_eq!(url_merge(&local, "", &[]), "http://127.0.0.1:9876/");
}
