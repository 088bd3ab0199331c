use crate::core::config::{NonceGenerator, DEFAULT_REST_URL};
use crate::core::errors::BitstampError;
use crate::core::kernel::signer::{default_nonce, timestamp_millis, SignedRequestContext, Signer};
use crate::core::types::Reason;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of a signed request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Encoded sorted by key; a repeated key keeps its last value.
    Form(Vec<(String, String)>),
    Json(Value),
}

impl RequestBody {
    /// Build a form body from borrowed pairs.
    pub fn form(params: &[(&str, &str)]) -> Self {
        Self::Form(
            params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    /// Content type and exact payload text. An empty payload means no body.
    pub fn encode(&self) -> Result<(&'static str, String), BitstampError> {
        match self {
            Self::Empty => Ok((FORM_CONTENT_TYPE, String::new())),
            Self::Form(params) => {
                let sorted: BTreeMap<&str, &str> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let payload = serde_urlencoded::to_string(&sorted).map_err(|e| {
                    BitstampError::InvalidParameters(format!("Failed to encode form body: {}", e))
                })?;
                Ok((FORM_CONTENT_TYPE, payload))
            }
            Self::Json(Value::Null) => Ok((JSON_CONTENT_TYPE, String::new())),
            Self::Json(value) => Ok((JSON_CONTENT_TYPE, serde_json::to_string(value)?)),
        }
    }
}

/// REST client trait for making HTTP requests
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Unsigned GET decoded into `T`.
    ///
    /// Non-2xx statuses become [`BitstampError::RequestFailed`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, BitstampError>;

    /// X-Auth signed request with the response signature verified.
    ///
    /// # Arguments
    /// * `method` - GET or POST
    /// * `endpoint` - Path relative to the base URL
    /// * `query_params` - Query parameters, included in the signed URL
    /// * `body` - Empty, form or JSON body
    async fn signed_request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<T, BitstampError>;

    /// POST with `key`/`signature`/`nonce` form credentials.
    async fn legacy_post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BitstampError>;
}

/// Configuration for the REST client
#[derive(Clone)]
pub struct RestClientConfig {
    /// Base URL for the API, path prefix included
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    pub nonce_generator: NonceGenerator,
}

impl std::fmt::Debug for RestClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClientConfig")
            .field("base_url", &self.base_url)
            .field("exchange_name", &self.exchange_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REST_URL.to_string(), "bitstamp".to_string())
    }
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("bitstamp-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            nonce_generator: Arc::new(default_nonce),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_nonce_generator(mut self, generator: NonceGenerator) -> Self {
        self.nonce_generator = generator;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    legacy_signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            legacy_signer: None,
        }
    }

    /// Set the signer for X-Auth requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Set the signer for form-credential requests
    pub fn with_legacy_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.legacy_signer = Some(signer);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, BitstampError> {
        let base_url = Url::parse(&self.config.base_url).map_err(|e| {
            BitstampError::ConfigError(crate::core::config::ConfigError::InvalidConfiguration(
                format!("invalid base url '{}': {}", self.config.base_url, e),
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                BitstampError::NetworkError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            base_url,
            config: self.config,
            signer: self.signer,
            legacy_signer: self.legacy_signer,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    base_url: Url,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    legacy_signer: Option<Arc<dyn Signer>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("has_legacy_signer", &self.legacy_signer.is_some())
            .finish_non_exhaustive()
    }
}

/// Join `path` onto `base` and merge `query_params` into its query string.
///
/// Path segments are joined with single slashes and `.`/`..` are resolved. A
/// trailing slash on `path` is kept; with an empty `path` the base's own
/// trailing slash is kept instead. Query keys are sorted and a repeated key
/// keeps its last value. No `?` is emitted without parameters.
pub fn url_merge(base: &Url, path: &str, query_params: &[(&str, &str)]) -> String {
    let mut url = base.clone();
    url.set_path(&join_path(base.path(), path));

    let mut merged: BTreeMap<String, String> = base.query_pairs().into_owned().collect();
    for (key, value) in query_params {
        merged.insert((*key).to_string(), (*value).to_string());
    }

    if merged.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(merged.iter());
    }
    url.to_string()
}

fn join_path(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut joined = format!("/{}", segments.join("/"));
    let trailing = if path.is_empty() {
        base.ends_with('/')
    } else {
        path.ends_with('/')
    };
    if trailing && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Decode a success body, unwrapping `{"data": ...}` when the direct shape
/// does not fit.
///
/// An empty body is still a success. It decodes as the first of `null`, `{}`
/// and `[]` that `T` accepts, so `Option` targets come back `None` and
/// defaulted structs and collections come back empty.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, BitstampError> {
    if body.is_empty() {
        return decode_empty();
    }

    match serde_json::from_slice::<T>(body) {
        Ok(value) => Ok(value),
        Err(direct) if direct.is_data() => serde_json::from_slice::<DataEnvelope<T>>(body)
            .map(|envelope| envelope.data)
            .map_err(|_| BitstampError::JsonError(direct)),
        Err(direct) => Err(BitstampError::JsonError(direct)),
    }
}

fn decode_empty<T: DeserializeOwned>() -> Result<T, BitstampError> {
    serde_json::from_value(Value::Null)
        .or_else(|_| serde_json::from_value(Value::Object(Map::new())))
        .or_else(|_| serde_json::from_value(Value::Array(Vec::new())))
        .map_err(|e| BitstampError::DeserializationError(format!("empty response body: {}", e)))
}

/// Map a non-success status of a signed call to an error.
pub fn error_from_status(status: u16, body: &[u8]) -> BitstampError {
    if status == 503 {
        return BitstampError::ServiceUnavailable;
    }

    if let Ok(fields) = serde_json::from_slice::<Map<String, Value>>(body) {
        if let (Some(code), Some(reason)) = (fields.get("code"), fields.get("reason")) {
            let code = match code {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let reason = serde_json::from_value::<Reason>(reason.clone())
                .unwrap_or_else(|_| Reason::Other(reason.clone()));
            return BitstampError::ApiError {
                status,
                code,
                reason,
            };
        }
    }

    BitstampError::HttpStatus {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

fn send_error(e: reqwest::Error) -> BitstampError {
    if e.is_timeout() {
        BitstampError::ConnectionTimeout(format!("Request timed out: {}", e))
    } else {
        BitstampError::HttpError(e)
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint and its query parameters
    pub fn build_url(&self, endpoint: &str, query_params: &[(&str, &str)]) -> String {
        url_merge(&self.base_url, endpoint, query_params)
    }

    async fn read_body(response: reqwest::Response) -> Result<(u16, HeaderMap, Vec<u8>), BitstampError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            BitstampError::NetworkError(format!("Failed to read response body: {}", e))
        })?;
        trace!("Response body: {}", String::from_utf8_lossy(&body));
        Ok((status, headers, body.to_vec()))
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, BitstampError> {
        let url = self.build_url(endpoint, query_params);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            BitstampError::NetworkError(format!("Failed to read response body: {}", e))
        })?;
        trace!("Response body: {}", body);

        if !status.is_success() {
            return Err(BitstampError::RequestFailed {
                code: status.as_u16(),
                status: status.to_string(),
                body,
                url,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self, query_params, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn signed_request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<T, BitstampError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            BitstampError::AuthError("Authentication required but no signer provided".to_string())
        })?;

        let url = self.build_url(endpoint, query_params);
        let (content_type, payload) = body.encode()?;
        let nonce = (self.config.nonce_generator)();
        let timestamp = timestamp_millis();
        let ctx = SignedRequestContext {
            method: method.as_str(),
            url: &url,
            content_type,
            payload: &payload,
            nonce: &nonce,
            timestamp: &timestamp,
        };

        let (headers, _) = signer.sign_request(&ctx)?;
        let mut request = self.client.request(method.clone(), &url);
        for (key, value) in &headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if !payload.is_empty() {
            request = request
                .header(CONTENT_TYPE, content_type)
                .body(payload.clone());
        }

        let response = request.send().await.map_err(send_error)?;
        let (status, response_headers, response_body) = Self::read_body(response).await?;

        match status {
            200 | 201 | 204 => {
                signer.verify_response(&ctx, &response_headers, &response_body)?;
                decode_body(&response_body)
            }
            _ => {
                debug!(status, "signed request rejected");
                Err(error_from_status(status, &response_body))
            }
        }
    }

    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint))]
    async fn legacy_post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BitstampError> {
        let signer = self.legacy_signer.as_ref().ok_or_else(|| {
            BitstampError::AuthError(
                "Form credentials required but no legacy signer provided".to_string(),
            )
        })?;

        let url = self.build_url(endpoint, &[]);
        let nonce = (self.config.nonce_generator)();
        let timestamp = timestamp_millis();
        let ctx = SignedRequestContext {
            method: Method::POST.as_str(),
            url: &url,
            content_type: FORM_CONTENT_TYPE,
            payload: "",
            nonce: &nonce,
            timestamp: &timestamp,
        };
        let (headers, credentials) = signer.sign_request(&ctx)?;

        let mut fields: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        fields.extend(credentials);
        let (content_type, payload) = RequestBody::Form(fields).encode()?;

        let mut request = self.client.post(&url);
        for (key, value) in &headers {
            request = request.header(key.as_str(), value.as_str());
        }
        let response = request
            .header(CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await
            .map_err(send_error)?;
        let (status, response_headers, response_body) = Self::read_body(response).await?;

        if (200..300).contains(&status) {
            signer.verify_response(&ctx, &response_headers, &response_body)?;
            decode_body(&response_body)
        } else {
            Err(error_from_status(status, &response_body))
        }
    }
}
