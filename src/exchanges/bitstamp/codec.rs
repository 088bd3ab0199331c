use crate::core::errors::BitstampError;
use crate::core::kernel::codec::WsCodec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

pub const SUBSCRIBE_EVENT: &str = "bts:subscribe";
pub const UNSUBSCRIBE_EVENT: &str = "bts:unsubscribe";
/// Sent by the server shortly before it drops the connection for maintenance.
pub const RECONNECT_EVENT: &str = "bts:request_reconnect";

/// One inbound WebSocket event
///
/// `data` is kept as raw JSON; its shape depends on the channel
/// (`trade`, `data`, `order_created`, `bts:subscription_succeeded`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WsEvent {
    pub event: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

impl WsEvent {
    pub fn is_reconnect_request(&self) -> bool {
        self.event == RECONNECT_EVENT
    }

    pub fn is_subscription_succeeded(&self) -> bool {
        self.event == "bts:subscription_succeeded"
    }

    pub fn is_error(&self) -> bool {
        self.event == "bts:error"
    }

    /// Decode `data` into a concrete payload type.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, BitstampError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            BitstampError::DeserializationError(format!(
                "failed to decode {} payload on {}: {}",
                self.event, self.channel, e
            ))
        })
    }
}

#[derive(Debug, Serialize)]
struct ChannelRequest<'a> {
    event: &'a str,
    data: ChannelData<'a>,
}

#[derive(Debug, Serialize)]
struct ChannelData<'a> {
    channel: &'a str,
}

/// Codec for `wss://ws.bitstamp.net`
#[derive(Debug, Clone, Copy, Default)]
pub struct BitstampCodec;

impl BitstampCodec {
    fn channel_request(event: &str, channel: &str) -> Result<Message, BitstampError> {
        let request = ChannelRequest {
            event,
            data: ChannelData { channel },
        };
        let text = serde_json::to_string(&request)?;
        Ok(Message::Text(text))
    }
}

impl WsCodec for BitstampCodec {
    type Message = WsEvent;

    fn encode_subscription(&self, channel: &str) -> Result<Message, BitstampError> {
        Self::channel_request(SUBSCRIBE_EVENT, channel)
    }

    fn encode_unsubscription(&self, channel: &str) -> Result<Message, BitstampError> {
        Self::channel_request(UNSUBSCRIBE_EVENT, channel)
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, BitstampError> {
        let text = match message {
            Message::Text(text) => text,
            Message::Binary(data) => String::from_utf8(data).map_err(|e| {
                BitstampError::DeserializationError(format!(
                    "invalid UTF-8 in binary frame: {}",
                    e
                ))
            })?,
            _ => return Ok(None),
        };

        serde_json::from_str::<WsEvent>(&text)
            .map(Some)
            .map_err(|e| {
                BitstampError::DeserializationError(format!("failed to decode event: {}", e))
            })
    }
}
