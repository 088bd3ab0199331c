pub mod core;
pub mod exchanges;

pub use crate::core::config::ClientConfig;
pub use crate::core::errors::BitstampError;
pub use crate::core::kernel::{SessionState, WsConfig, WsSession};
pub use crate::core::types::{OrderBookEntry, Reason};
pub use crate::exchanges::bitstamp::{BitstampCodec, BitstampRestClient, WsEvent};
