use crate::core::config::ClientConfig;
use crate::core::errors::BitstampError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig, WsConfig, WsSession};
use crate::exchanges::bitstamp::codec::BitstampCodec;
use crate::exchanges::bitstamp::rest::BitstampRestClient;
use crate::exchanges::bitstamp::signer::{BitstampSigner, LegacySigner};
use std::sync::Arc;
use tracing::debug;

/// Create a REST client from a [`ClientConfig`]
///
/// The X-Auth signer is installed when credentials are present and the
/// form-credential signer when a customer id is configured as well.
pub fn build_client(config: ClientConfig) -> Result<BitstampRestClient<ReqwestRest>, BitstampError> {
    config.validate()?;

    let mut rest_config = RestClientConfig::new(config.base_url.clone(), "bitstamp".to_string())
        .with_timeout(config.timeout_seconds);
    if let Some(generator) = config.nonce_generator.clone() {
        rest_config = rest_config.with_nonce_generator(generator);
    }

    let mut rest_builder = RestClientBuilder::new(rest_config);

    if config.has_credentials() {
        let signer = Arc::new(BitstampSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
        ));
        rest_builder = rest_builder.with_signer(signer);

        if let Some(customer_id) = config.customer_id.clone() {
            let legacy = Arc::new(LegacySigner::new(
                config.api_key().to_string(),
                config.secret_key().to_string(),
                customer_id,
            ));
            rest_builder = rest_builder.with_legacy_signer(legacy);
        }
    }

    debug!(
        base_url = %config.base_url,
        authenticated = config.has_credentials(),
        auto_rounding = config.auto_rounding,
        "building bitstamp client"
    );

    let rest = rest_builder.build()?;
    Ok(BitstampRestClient::new(rest).with_auto_rounding(config.auto_rounding))
}

/// Create a client for public market data only
pub fn build_public_client() -> Result<BitstampRestClient<ReqwestRest>, BitstampError> {
    build_client(ClientConfig::read_only())
}

/// Open a WebSocket session speaking the Bitstamp channel protocol
pub async fn connect_websocket(config: WsConfig) -> Result<WsSession<BitstampCodec>, BitstampError> {
    WsSession::connect(config, BitstampCodec).await
}
