pub mod codec;
pub mod pairs;
pub mod signer;
pub mod types;

pub mod account;
pub mod builder;
pub mod derivatives;
pub mod rest;
pub mod trading;

// Re-export main components
pub use builder::{build_client, build_public_client, connect_websocket};
pub use codec::{BitstampCodec, WsEvent, RECONNECT_EVENT};
pub use pairs::{validate_currency_pair, PairPrecision};
pub use rest::BitstampRestClient;
pub use signer::{BitstampSigner, LegacySigner};
pub use types::{
    MarginMode, MarketSide, MarketType, OrderOptions, OrderSide, PositionStatus, SettlementFilter,
    SettlementType, Sort, TransactionsTime,
};
