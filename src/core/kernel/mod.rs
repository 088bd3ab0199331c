/// Transport kernel shared by the Bitstamp REST and WebSocket clients
///
/// # Components
///
/// ## Transport Layer
/// - `RestClient`: HTTP interface with unsigned GET, X-Auth signed requests
///   and form-credential requests
/// - `WsSession`: one WebSocket connection with a background read task
///
/// ## Authentication
/// - `Signer`: pluggable request signing and response verification
///
/// ## Message Handling
/// - `WsCodec`: frame encoding/decoding for a WebSocket protocol
///
/// ## REST client with credentials
/// ```rust,no_run
/// use bitstamp::core::kernel::*;
/// use bitstamp::exchanges::bitstamp::signer::BitstampSigner;
/// use bitstamp::exchanges::bitstamp::types::Ticker;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new(
///     "https://www.bitstamp.net/api".to_string(),
///     "bitstamp".to_string(),
/// );
/// let signer = Arc::new(BitstampSigner::new("key".to_string(), "secret".to_string()));
/// let rest = RestClientBuilder::new(rest_config)
///     .with_signer(signer)
///     .build()?;
///
/// let ticker: Ticker = rest.get_json("/v2/ticker/btcusd/", &[]).await?;
/// # Ok(())
/// # }
/// ```
///
/// ## WebSocket session
/// ```rust,no_run
/// use bitstamp::core::kernel::*;
/// use bitstamp::exchanges::bitstamp::codec::BitstampCodec;
///
/// # async fn websocket_example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = WsSession::connect(WsConfig::default(), BitstampCodec).await?;
/// session.subscribe(&["live_trades_btcusd"]).await?;
///
/// let mut streams = session.take_streams().expect("streams are taken once");
/// if let Some(event) = streams.events.recv().await {
///     if event.is_reconnect_request() {
///         let fresh = session.reconnect().await?;
///         session.close().await?;
///         drop(fresh);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::WsCodec;
pub use rest::{url_merge, ReqwestRest, RequestBody, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{SignatureResult, SignedRequestContext, Signer};
pub use ws::{SessionState, WsConfig, WsSession, WsStreams};
