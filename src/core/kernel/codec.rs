use crate::core::errors::BitstampError;
use tokio_tungstenite::tungstenite::Message;

/// Converts between raw WebSocket frames and typed messages
///
/// Control frames (ping, pong, close) never reach the codec; the session
/// handles them at the transport level.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this exchange
    type Message: Send + Sync + 'static;

    /// Encode the frame that subscribes to a single channel
    fn encode_subscription(&self, channel: &str) -> Result<Message, BitstampError>;

    /// Encode the frame that unsubscribes from a single channel
    fn encode_unsubscription(&self, channel: &str) -> Result<Message, BitstampError>;

    /// Decode a raw data frame
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Frame was ignored by the codec
    /// - `Err(error)` - Frame could not be decoded
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, BitstampError>;
}
