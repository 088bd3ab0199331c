use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_REST_URL: &str = "https://www.bitstamp.net/api";

/// Produces a fresh nonce for every signed request.
pub type NonceGenerator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    /// Only needed for the legacy form-credential signature.
    pub customer_id: Option<String>,
    pub base_url: String,
    /// Round order amount/price to the pair's precision before sending.
    pub auto_rounding: bool,
    pub timeout_seconds: u64,
    /// Overrides the default UUID v4 nonce.
    pub nonce_generator: Option<NonceGenerator>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("secret_key", &self.secret_key)
            .field("customer_id", &self.customer_id)
            .field("base_url", &self.base_url)
            .field("auto_rounding", &self.auto_rounding)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("custom_nonce", &self.nonce_generator.is_some())
            .finish()
    }
}

// Secrets never leave the process through serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("customer_id", &self.customer_id)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("auto_rounding", &self.auto_rounding)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            customer_id: Option<String>,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            auto_rounding: bool,
            #[serde(default)]
            timeout_seconds: Option<u64>,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            customer_id: helper.customer_id,
            base_url: helper
                .base_url
                .unwrap_or_else(|| DEFAULT_REST_URL.to_string()),
            auto_rounding: helper.auto_rounding,
            timeout_seconds: helper.timeout_seconds.unwrap_or(30),
            nonce_generator: None,
        })
    }
}

impl ClientConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            customer_id: None,
            base_url: DEFAULT_REST_URL.to_string(),
            auto_rounding: false,
            timeout_seconds: 30,
            nonce_generator: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BITSTAMP_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY`
    /// - `{PREFIX}_CUSTOMER_ID` (optional)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_AUTO_ROUNDING` (optional, defaults to false)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let mut config = Self::new(api_key, secret_key);
        config.customer_id = env::var(format!("{}_CUSTOMER_ID", prefix)).ok();
        if let Ok(base_url) = env::var(format!("{}_BASE_URL", prefix)) {
            config.base_url = base_url;
        }
        config.auto_rounding = env::var(format!("{}_AUTO_ROUNDING", prefix))
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// Load a .env file (if present) and then read the environment.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public market data only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Check the base URL parses and uses an http(s) scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::InvalidConfiguration(format!(
                "invalid base url '{}': {}",
                self.base_url, e
            ))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "unsupported scheme '{}' in base url",
                other
            ))),
        }
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    #[must_use]
    pub const fn auto_rounding(mut self, enabled: bool) -> Self {
        self.auto_rounding = enabled;
        self
    }

    #[must_use]
    pub const fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub fn nonce_generator(mut self, generator: NonceGenerator) -> Self {
        self.nonce_generator = Some(generator);
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
