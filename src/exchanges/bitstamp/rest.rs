use crate::core::errors::BitstampError;
use crate::core::kernel::RestClient;
use crate::exchanges::bitstamp::pairs::validate_currency_pair;
use crate::exchanges::bitstamp::types::{
    EurUsdRate, OhlcResponse, OrderBook, Ticker, TradingPairInfo, Transaction, TransactionsTime,
};

pub const OHLC_STEPS: [u32; 12] = [
    60, 180, 300, 900, 1800, 3600, 7200, 14400, 21600, 43200, 86400, 259200,
];

fn group_param(group: u8) -> Result<String, BitstampError> {
    if group > 2 {
        return Err(BitstampError::InvalidParameters(format!(
            "invalid group parameter value: {}",
            group
        )));
    }
    Ok(group.to_string())
}

/// Thin typed wrapper around `RestClient` for the Bitstamp v2 API
///
/// Public market data lives here; the signed account, trading and
/// derivatives endpoints are implemented in sibling modules.
pub struct BitstampRestClient<R: RestClient> {
    pub(crate) client: R,
    pub(crate) auto_rounding: bool,
}

impl<R: RestClient> BitstampRestClient<R> {
    pub fn new(client: R) -> Self {
        Self {
            client,
            auto_rounding: false,
        }
    }

    /// Round limit order amounts and prices to the pair's precision before sending
    pub fn with_auto_rounding(mut self, enabled: bool) -> Self {
        self.auto_rounding = enabled;
        self
    }

    pub fn auto_rounding(&self) -> bool {
        self.auto_rounding
    }

    /// Access the underlying transport
    pub fn inner(&self) -> &R {
        &self.client
    }

    /// Get the ticker for a currency pair
    pub async fn ticker(&self, pair: &str) -> Result<Ticker, BitstampError> {
        validate_currency_pair(pair)?;
        self.client
            .get_json(&format!("/v2/ticker/{}/", pair), &[])
            .await
    }

    /// Get the hourly ticker for a currency pair
    pub async fn hourly_ticker(&self, pair: &str) -> Result<Ticker, BitstampError> {
        validate_currency_pair(pair)?;
        self.client
            .get_json(&format!("/v2/ticker_hour/{}/", pair), &[])
            .await
    }

    /// BTC/USD ticker from the v1 API
    pub async fn v1_ticker(&self) -> Result<Ticker, BitstampError> {
        self.client.get_json("/ticker/", &[]).await
    }

    /// BTC/USD hourly ticker from the v1 API
    pub async fn v1_hourly_ticker(&self) -> Result<Ticker, BitstampError> {
        self.client.get_json("/ticker_hour/", &[]).await
    }

    /// Get the order book
    ///
    /// `group` is 0 (no grouping), 1 (grouped by price) or 2 (ungrouped with
    /// order ids).
    pub async fn order_book(&self, pair: &str, group: u8) -> Result<OrderBook, BitstampError> {
        validate_currency_pair(pair)?;
        let group = group_param(group)?;
        self.client
            .get_json(&format!("/v2/order_book/{}/", pair), &[("group", &group)])
            .await
    }

    /// BTC/USD order book from the v1 API. It carries no `microtimestamp`.
    pub async fn v1_order_book(&self, group: u8) -> Result<OrderBook, BitstampError> {
        let group = group_param(group)?;
        self.client
            .get_json("/order_book/", &[("group", &group)])
            .await
    }

    /// Get recent public trades
    pub async fn transactions(
        &self,
        pair: &str,
        time: Option<TransactionsTime>,
    ) -> Result<Vec<Transaction>, BitstampError> {
        validate_currency_pair(pair)?;
        let endpoint = format!("/v2/transactions/{}/", pair);
        match time {
            Some(time) => {
                self.client
                    .get_json(&endpoint, &[("time", time.as_str())])
                    .await
            }
            None => self.client.get_json(&endpoint, &[]).await,
        }
    }

    /// Get the description of every trading pair
    pub async fn trading_pairs_info(&self) -> Result<Vec<TradingPairInfo>, BitstampError> {
        self.client.get_json("/v2/trading-pairs-info/", &[]).await
    }

    /// Get OHLC candles
    ///
    /// `step` is the candle width in seconds and `limit` is between 1 and
    /// 1000. A non-zero `end` takes precedence over `start`.
    pub async fn ohlc(
        &self,
        pair: &str,
        step: u32,
        limit: u32,
        start: i64,
        end: i64,
    ) -> Result<OhlcResponse, BitstampError> {
        validate_currency_pair(pair)?;
        if !OHLC_STEPS.contains(&step) {
            return Err(BitstampError::InvalidParameters(format!(
                "invalid value for step parameter: {}",
                step
            )));
        }
        if !(1..=1000).contains(&limit) {
            return Err(BitstampError::InvalidParameters(format!(
                "invalid value for limit parameter: {}",
                limit
            )));
        }

        let step_str = step.to_string();
        let limit_str = limit.to_string();
        let bound;
        let mut params = vec![("step", step_str.as_str()), ("limit", limit_str.as_str())];
        if end != 0 {
            bound = end.to_string();
            params.push(("end", bound.as_str()));
        } else if start != 0 {
            bound = start.to_string();
            params.push(("start", bound.as_str()));
        }

        self.client
            .get_json(&format!("/v2/ohlc/{}/", pair), &params)
            .await
    }

    /// Get the EUR/USD conversion rate
    pub async fn eur_usd(&self) -> Result<EurUsdRate, BitstampError> {
        self.client.get_json("/v2/eur_usd/", &[]).await
    }
}
