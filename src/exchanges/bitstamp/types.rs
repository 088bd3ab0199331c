use crate::core::errors::BitstampError;
use crate::core::types::{micros_datetime, option_string_or_int, string_or_int, OrderBookEntry, Reason};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginMode {
    Cross,
    Isolated,
}

impl MarginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cross => "CROSS",
            Self::Isolated => "ISOLATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    Spot,
    Perpetual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    WaitingSettlement,
    Settled,
    Liquidating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementType {
    Periodic,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    #[default]
    Desc,
    Asc,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosePositionOrderType {
    #[default]
    Market,
}

/// `time` filter of the public transactions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionsTime {
    Minute,
    Hour,
    Day,
}

impl TransactionsTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl FromStr for TransactionsTime {
    type Err = BitstampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(BitstampError::InvalidParameters(format!(
                "invalid value for time interval: {}",
                other
            ))),
        }
    }
}

/// Price fields missing from the body read as zero; `timestamp` is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ticker {
    #[serde(default)]
    pub ask: Decimal,
    #[serde(default)]
    pub bid: Decimal,
    #[serde(default)]
    pub high: Decimal,
    #[serde(default)]
    pub last: Decimal,
    #[serde(default)]
    pub low: Decimal,
    #[serde(default)]
    pub open: Decimal,
    #[serde(with = "string_or_int")]
    pub timestamp: i64,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub vwap: Decimal,
    #[serde(default)]
    pub open_24: Option<Decimal>,
    #[serde(default)]
    pub percent_change_24: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderBook {
    /// Unix seconds
    #[serde(with = "string_or_int")]
    pub timestamp: i64,
    #[serde(default, with = "option_string_or_int")]
    pub microtimestamp: Option<i64>,
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub amount: Decimal,
    #[serde(with = "string_or_int")]
    pub date: i64,
    pub price: Decimal,
    #[serde(with = "string_or_int")]
    pub tid: i64,
    /// 0 (buy) or 1 (sell)
    #[serde(rename = "type", with = "string_or_int")]
    pub transaction_type: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TradingPairInfo {
    pub name: String,
    pub url_symbol: String,
    pub base_decimals: u32,
    pub counter_decimals: u32,
    pub instant_order_counter_decimals: Option<u32>,
    pub minimum_order: String,
    pub trading: String,
    pub instant_and_market_orders: String,
    pub description: String,
}

impl TradingPairInfo {
    pub fn is_trading_enabled(&self) -> bool {
        self.trading.eq_ignore_ascii_case("enabled")
    }

    pub fn instant_and_market_orders_enabled(&self) -> bool {
        self.instant_and_market_orders.eq_ignore_ascii_case("enabled")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(with = "string_or_int")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OhlcData {
    pub pair: String,
    pub ohlc: Vec<Ohlc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OhlcResponse {
    pub data: OhlcData,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EurUsdRate {
    pub buy: Decimal,
    pub sell: Decimal,
}

/// Flat balance map as returned by `/v2/balance/`.
///
/// Keys look like `btc_available`, `btc_balance`, `btc_reserved`,
/// `btc_withdrawal_fee`, `btcusd_fee` and `fee`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Balance {
    pub entries: BTreeMap<String, Option<Decimal>>,
}

impl Balance {
    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.entries.get(key).copied().flatten()
    }

    pub fn available(&self, currency: &str) -> Option<Decimal> {
        self.get(&format!("{}_available", currency))
    }

    pub fn balance(&self, currency: &str) -> Option<Decimal> {
        self.get(&format!("{}_balance", currency))
    }

    pub fn reserved(&self, currency: &str) -> Option<Decimal> {
        self.get(&format!("{}_reserved", currency))
    }

    pub fn withdrawal_fee(&self, currency: &str) -> Option<Decimal> {
        self.get(&format!("{}_withdrawal_fee", currency))
    }

    /// Trading fee for a pair, or the single `fee` of a per-pair balance call.
    pub fn trading_fee(&self, pair: Option<&str>) -> Option<Decimal> {
        match pair {
            Some(pair) => self.get(&format!("{}_fee", pair)),
            None => self.get("fee"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountBalance {
    pub currency: String,
    pub available: Decimal,
    pub reserved: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserTransaction {
    pub datetime: String,
    #[serde(with = "string_or_int")]
    pub id: i64,
    #[serde(default, with = "option_string_or_int")]
    pub order_id: Option<i64>,
    /// 0 deposit, 1 withdrawal, 2 market trade, 14 sub account transfer, ...
    #[serde(rename = "type", with = "string_or_int")]
    pub transaction_type: i64,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<Reason>,
    /// Per-currency amounts and the trade rate (`btc`, `usd`, `btc_usd`, ...).
    #[serde(flatten)]
    pub amounts: BTreeMap<String, Value>,
}

impl UserTransaction {
    pub fn amount(&self, key: &str) -> Option<Decimal> {
        decimal_from_value(self.amounts.get(key)?)
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoTransfer {
    #[serde(default, with = "option_string_or_int")]
    pub datetime: Option<i64>,
    #[serde(default)]
    pub txid: String,
    #[serde(default, rename = "destinationAddress")]
    pub destination_address: String,
    pub amount: Decimal,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default, rename = "type")]
    pub transfer_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CryptoTransactions {
    pub deposits: Vec<CryptoTransfer>,
    pub withdrawals: Vec<CryptoTransfer>,
    pub ripple_iou_transactions: Vec<CryptoTransfer>,
    pub status: Option<String>,
    pub reason: Option<Reason>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CryptoAddress {
    pub address: Option<String>,
    pub destination_tag: Option<Value>,
    pub memo_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalRequest {
    #[serde(with = "string_or_int")]
    pub id: i64,
    pub datetime: String,
    #[serde(default, rename = "type", with = "option_string_or_int")]
    pub withdrawal_type: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub amount: Decimal,
    #[serde(default, with = "option_string_or_int")]
    pub status: Option<i64>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub reason: Option<Reason>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WithdrawalFee {
    pub currency: String,
    pub fee: Decimal,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fees {
    pub maker: Decimal,
    pub taker: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradingFee {
    pub currency_pair: String,
    #[serde(default)]
    pub market: Option<String>,
    pub fees: Fees,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebsocketsToken {
    pub token: String,
    pub valid_sec: u32,
    pub user_id: u32,
}

/// Optional order parameters.
///
/// `daily_order`, `ioc_order`, `fok_order` and `limit_price` only apply to
/// limit orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderOptions {
    pub limit_price: Option<Decimal>,
    pub daily_order: bool,
    pub ioc_order: bool,
    pub fok_order: bool,
    pub client_order_id: Option<String>,
    pub margin_mode: Option<MarginMode>,
    pub leverage: Option<Decimal>,
    pub reduce_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrder {
    #[serde(with = "string_or_int")]
    pub id: i64,
    pub datetime: String,
    /// 0 (buy) or 1 (sell)
    #[serde(rename = "type", with = "string_or_int")]
    pub order_type: i64,
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub amount_at_create: Option<Decimal>,
    #[serde(default)]
    pub currency_pair: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    #[serde(default)]
    pub margin_mode: Option<MarginMode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusTransaction {
    #[serde(with = "string_or_int")]
    pub tid: i64,
    pub price: Decimal,
    pub fee: Decimal,
    pub datetime: String,
    #[serde(rename = "type", with = "string_or_int")]
    pub transaction_type: i64,
    /// Base and counter amounts keyed by currency.
    #[serde(flatten)]
    pub amounts: BTreeMap<String, Value>,
}

impl OrderStatusTransaction {
    pub fn amount(&self, currency: &str) -> Option<Decimal> {
        decimal_from_value(self.amounts.get(currency)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderStatus {
    #[serde(with = "option_string_or_int")]
    pub id: Option<i64>,
    pub datetime: Option<String>,
    pub status: String,
    pub market: Option<String>,
    pub transactions: Vec<OrderStatusTransaction>,
    pub amount_remaining: Option<Decimal>,
    pub client_order_id: Option<String>,
    pub reason: Option<Reason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CancelledOrder {
    #[serde(with = "option_string_or_int")]
    pub id: Option<i64>,
    pub amount: Option<Decimal>,
    pub price: Option<Decimal>,
    #[serde(rename = "type", with = "option_string_or_int")]
    pub order_type: Option<i64>,
    pub market: Option<String>,
    pub error: Option<String>,
}

/// Answer to a limit, market or instant order.
///
/// A rejected order comes back with `status: "error"` and a `reason`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderResponse {
    #[serde(with = "option_string_or_int")]
    pub id: Option<i64>,
    pub datetime: Option<String>,
    #[serde(rename = "type", with = "option_string_or_int")]
    pub order_type: Option<i64>,
    pub subtype: Option<String>,
    pub market: Option<String>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub client_order_id: Option<String>,
    pub leverage: Option<Decimal>,
    pub margin_mode: Option<MarginMode>,
    pub stop_price: Option<Decimal>,
    pub trigger: Option<String>,
    pub activation_price: Option<Decimal>,
    pub trailing_delta: Option<Decimal>,
    pub status: Option<String>,
    pub reason: Option<Reason>,
}

/// Implemented by responses that report failures in a 200 body.
pub trait StatusReport {
    fn status(&self) -> Option<&str>;
    fn reason(&self) -> Option<&Reason>;

    fn is_error(&self) -> bool {
        self.status() == Some("error")
    }
}

impl StatusReport for OrderResponse {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn reason(&self) -> Option<&Reason> {
        self.reason.as_ref()
    }
}

impl StatusReport for OrderStatus {
    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn reason(&self) -> Option<&Reason> {
        self.reason.as_ref()
    }
}

/// Turn a `"status": "error"` body into [`BitstampError::OrderRejected`].
pub fn reject_on_error<T: StatusReport>(response: T, context: impl FnOnce() -> String) -> Result<T, BitstampError> {
    if response.is_error() {
        return Err(BitstampError::OrderRejected {
            context: context(),
            reason: response
                .reason()
                .cloned()
                .unwrap_or_else(|| Reason::Other(Value::Null)),
        });
    }
    Ok(response)
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenPosition {
    pub id: String,
    pub market: String,
    pub market_type: MarketType,
    pub margin_mode: MarginMode,
    #[serde(default)]
    pub side: Option<MarketSide>,
    #[serde(default)]
    pub settlement_currency: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    #[serde(default)]
    pub mark_price: Option<Decimal>,
    #[serde(default)]
    pub strike_price: Option<Decimal>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    #[serde(default)]
    pub implied_leverage: Option<Decimal>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub pnl_percentage: Option<Decimal>,
    #[serde(default)]
    pub pnl_realized: Option<Decimal>,
    #[serde(default)]
    pub pnl_unrealized: Option<Decimal>,
    #[serde(default)]
    pub pnl_settled_since_inception: Option<Decimal>,
    #[serde(default)]
    pub initial_margin: Option<Decimal>,
    #[serde(default)]
    pub initial_margin_ratio: Option<Decimal>,
    #[serde(default)]
    pub current_margin: Option<Decimal>,
    #[serde(default)]
    pub collateral_reserved: Option<Decimal>,
    #[serde(default)]
    pub maintenance_margin: Option<Decimal>,
    #[serde(default)]
    pub maintenance_margin_ratio: Option<Decimal>,
    #[serde(default)]
    pub estimated_liquidation_price: Option<Decimal>,
    #[serde(default)]
    pub estimated_closing_fee_amount: Option<Decimal>,
    #[serde(default)]
    pub current_value: Option<Decimal>,
    #[serde(default)]
    pub entry_value: Option<Decimal>,
}

/// A closed, settled or closing position.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionSummary {
    pub id: String,
    pub market: String,
    pub market_type: MarketType,
    pub margin_mode: MarginMode,
    #[serde(default)]
    pub pnl_currency: Option<String>,
    #[serde(default)]
    pub status: Option<PositionStatus>,
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    pub settlement_price: Option<Decimal>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub pnl_percentage: Option<Decimal>,
    #[serde(default)]
    pub pnl_realized: Option<Decimal>,
    #[serde(default)]
    pub pnl_settled: Option<Decimal>,
    #[serde(default)]
    pub amount_delta: Option<Decimal>,
    #[serde(default)]
    pub closing_fee_amount: Option<Decimal>,
    #[serde(default, with = "micros_datetime")]
    pub time_opened: Option<DateTime<Utc>>,
    #[serde(default, with = "micros_datetime")]
    pub time_closed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClosePositionsResult {
    pub closed: Vec<PositionSummary>,
    pub failed: Vec<PositionSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarginAsset {
    pub asset: String,
    pub available: Decimal,
    pub margin_available: Decimal,
    pub reserved: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarginInfo {
    pub account_margin: Option<Decimal>,
    pub account_margin_available: Option<Decimal>,
    pub account_margin_reserved: Option<Decimal>,
    pub assets: Vec<MarginAsset>,
    pub implied_leverage: Option<Decimal>,
    pub initial_margin_ratio: Option<Decimal>,
    pub maintenance_margin_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementTransaction {
    pub transaction_id: String,
    pub position_id: String,
    #[serde(default, with = "micros_datetime")]
    pub settlement_time: Option<DateTime<Utc>>,
    pub settlement_type: SettlementType,
    pub market: String,
    pub market_type: MarketType,
    pub margin_mode: MarginMode,
    #[serde(default)]
    pub pnl_currency: Option<String>,
    #[serde(default)]
    pub settlement_price: Option<Decimal>,
    #[serde(default)]
    pub strike_price: Option<Decimal>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub pnl_settled: Option<Decimal>,
    #[serde(default)]
    pub pnl_component_price: Option<Decimal>,
    #[serde(default)]
    pub pnl_component_fees: Option<Decimal>,
    #[serde(default)]
    pub pnl_component_funding: Option<Decimal>,
    #[serde(default)]
    pub pnl_component_socialized_loss: Option<Decimal>,
}

/// Filters for the settlement transactions list.
///
/// `offset` defaults to 0 (at most 200000), `limit` to 100 (at most 1000)
/// and `sort` to descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementFilter {
    pub market: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<Sort>,
    pub since_timestamp: Option<i64>,
    pub until_timestamp: Option<i64>,
    pub since_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollateralAdjustment {
    pub code: Option<String>,
    pub field: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollateralCurrency {
    pub currency: String,
    pub haircut: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeverageSetting {
    pub market: String,
    pub margin_mode: MarginMode,
    pub leverage_current: Decimal,
    pub leverage_max: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_from_strings() {
        let ticker: Ticker = serde_json::from_str(
            r#"{"high": "27500", "last": "27123", "timestamp": "1695300000", "bid": "27122",
                "vwap": "27200.5", "volume": "1234.56789012", "low": "26900", "ask": "27124",
                "open": "27000", "open_24": "26950", "percent_change_24": "0.64"}"#,
        )
        .unwrap();
        assert_eq!(ticker.timestamp, 1_695_300_000);
        assert_eq!(ticker.volume.to_string(), "1234.56789012");
        assert_eq!(ticker.percent_change_24, Some(Decimal::from_str("0.64").unwrap()));
    }

    #[test]
    fn test_ticker_requires_timestamp() {
        assert!(serde_json::from_str::<Ticker>("{}").is_err());
        assert!(serde_json::from_str::<Ticker>(r#"{"last": "1.5"}"#).is_err());

        let sparse: Ticker = serde_json::from_str(r#"{"timestamp": 1695300000}"#).unwrap();
        assert_eq!(sparse.last, Decimal::ZERO);
        assert_eq!(sparse.open_24, None);
    }

    #[test]
    fn test_order_book_with_ids() {
        let book: OrderBook = serde_json::from_str(
            r#"{"timestamp": "1695300000", "microtimestamp": "1695300000123456",
                "bids": [["27122", "0.5", "1655555"]], "asks": [["27124", "0.25", "1655556"]]}"#,
        )
        .unwrap();
        assert_eq!(book.microtimestamp, Some(1_695_300_000_123_456));
        assert_eq!(book.bids[0].order_id, Some(1_655_555));
        assert_eq!(book.asks[0].amount, Decimal::from_str("0.25").unwrap());
    }

    #[test]
    fn test_balance_accessors() {
        let balance: Balance = serde_json::from_str(
            r#"{"btc_available": "0.5", "btc_balance": "1.0", "btc_reserved": "0.5",
                "btc_withdrawal_fee": "0.0001", "btcusd_fee": "0.3", "usd_available": null}"#,
        )
        .unwrap();
        assert_eq!(balance.available("btc"), Some(Decimal::from_str("0.5").unwrap()));
        assert_eq!(balance.trading_fee(Some("btcusd")), Some(Decimal::from_str("0.3").unwrap()));
        assert_eq!(balance.available("usd"), None);
        assert_eq!(balance.reserved("eth"), None);
    }

    #[test]
    fn test_user_transaction_amounts() {
        let tx: UserTransaction = serde_json::from_str(
            r#"{"datetime": "2023-09-21 12:00:00", "id": 1, "order_id": "2", "type": "2",
                "fee": "0.1", "btc": "0.001", "usd": "-27.12", "btc_usd": 27120}"#,
        )
        .unwrap();
        assert_eq!(tx.order_id, Some(2));
        assert_eq!(tx.transaction_type, 2);
        assert_eq!(tx.amount("usd"), Some(Decimal::from_str("-27.12").unwrap()));
        assert_eq!(tx.amount("btc_usd"), Some(Decimal::from(27_120)));
        assert_eq!(tx.amount("eth"), None);
    }

    #[test]
    fn test_rejected_order_response() {
        let response: OrderResponse = serde_json::from_str(
            r#"{"status": "error", "reason": {"__all__": ["You need 158338.86 USD to open that order."]}}"#,
        )
        .unwrap();
        let err = reject_on_error(response, || "placing limit buy".to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error placing limit buy: __all__: You need 158338.86 USD to open that order."
        );

        let accepted: OrderResponse =
            serde_json::from_str(r#"{"id": "1234", "price": "100", "amount": "1", "type": "0"}"#)
                .unwrap();
        let accepted = reject_on_error(accepted, || unreachable!()).unwrap();
        assert_eq!(accepted.id, Some(1234));
        assert_eq!(accepted.order_type, Some(0));
    }

    #[test]
    fn test_position_summary_micros() {
        let summary: PositionSummary = serde_json::from_str(
            r#"{"id": "p1", "market": "BTC/USD-PERP", "market_type": "PERPETUAL",
                "margin_mode": "CROSS", "status": "WAITING_SETTLEMENT",
                "time_opened": "1700000000000000", "time_closed": null}"#,
        )
        .unwrap();
        assert_eq!(summary.status, Some(PositionStatus::WaitingSettlement));
        assert_eq!(
            summary.time_opened.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
        assert!(summary.time_closed.is_none());
    }

    #[test]
    fn test_transactions_time_parse() {
        assert_eq!("hour".parse::<TransactionsTime>().unwrap(), TransactionsTime::Hour);
        assert!("week".parse::<TransactionsTime>().is_err());
        assert_eq!(Sort::default().as_str(), "desc");
        assert_eq!(serde_json::to_string(&MarginMode::Isolated).unwrap(), "\"ISOLATED\"");
    }
}
