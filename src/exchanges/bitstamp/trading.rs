use crate::core::errors::BitstampError;
use crate::core::kernel::{RequestBody, RestClient};
use crate::exchanges::bitstamp::pairs::{round_amount, round_price};
use crate::exchanges::bitstamp::rest::BitstampRestClient;
use crate::exchanges::bitstamp::types::{
    reject_on_error, CancelledOrder, OpenOrder, OrderOptions, OrderResponse, OrderSide,
    OrderStatus,
};
use reqwest::Method;
use rust_decimal::Decimal;
use tracing::debug;

const TRUE: &str = "True";

/// Form fields shared by every order type.
fn common_fields(fields: &mut Vec<(String, String)>, options: &OrderOptions) {
    if let Some(client_order_id) = &options.client_order_id {
        fields.push(("client_order_id".to_string(), client_order_id.clone()));
    }
    if let Some(margin_mode) = options.margin_mode {
        fields.push(("margin_mode".to_string(), margin_mode.as_str().to_string()));
    }
    if let Some(leverage) = options.leverage {
        fields.push(("leverage".to_string(), leverage.to_string()));
    }
    if options.reduce_only {
        fields.push(("reduce_only".to_string(), TRUE.to_string()));
    }
}

fn limit_order_fields(amount: Decimal, price: Decimal, options: &OrderOptions) -> Vec<(String, String)> {
    let mut fields = vec![
        ("amount".to_string(), amount.to_string()),
        ("price".to_string(), price.to_string()),
    ];
    if let Some(limit_price) = options.limit_price {
        fields.push(("limit_price".to_string(), limit_price.to_string()));
    }
    if options.daily_order {
        fields.push(("daily_order".to_string(), TRUE.to_string()));
    }
    if options.ioc_order {
        fields.push(("ioc_order".to_string(), TRUE.to_string()));
    }
    if options.fok_order {
        fields.push(("fok_order".to_string(), TRUE.to_string()));
    }
    common_fields(&mut fields, options);
    fields
}

fn market_order_fields(amount: Decimal, options: &OrderOptions) -> Vec<(String, String)> {
    let mut fields = vec![("amount".to_string(), amount.to_string())];
    common_fields(&mut fields, options);
    fields
}

impl<R: RestClient> BitstampRestClient<R> {
    /// Open orders for a pair, or every pair with `"all"`
    pub async fn open_orders(&self, pair_or_all: &str) -> Result<Vec<OpenOrder>, BitstampError> {
        let pair = if pair_or_all.is_empty() { "all" } else { pair_or_all };
        self.client
            .signed_request_json(
                Method::POST,
                &format!("/v2/open_orders/{}/", pair),
                &[],
                RequestBody::Empty,
            )
            .await
    }

    /// Status of one order, optionally looked up by client order id
    pub async fn order_status(
        &self,
        id: i64,
        client_order_id: Option<&str>,
        omit_transactions: bool,
    ) -> Result<OrderStatus, BitstampError> {
        let id_str = id.to_string();
        let mut params = vec![("id", id_str.as_str())];
        if let Some(client_order_id) = client_order_id.filter(|c| !c.is_empty()) {
            params.push(("client_order_id", client_order_id));
        }
        if omit_transactions {
            params.push(("omit_transactions", "true"));
        }

        let status: OrderStatus = self
            .client
            .signed_request_json(
                Method::POST,
                "/v2/order_status/",
                &[],
                RequestBody::form(&params),
            )
            .await?;
        reject_on_error(status, || format!("fetching status of order {}", id))
    }

    pub async fn cancel_order(&self, id: i64) -> Result<CancelledOrder, BitstampError> {
        let id = id.to_string();
        self.client
            .signed_request_json(
                Method::POST,
                "/v2/cancel_order/",
                &[],
                RequestBody::form(&[("id", id.as_str())]),
            )
            .await
    }

    pub async fn buy_limit_order(
        &self,
        pair: &str,
        price: Decimal,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.limit_order(OrderSide::Buy, pair, price, amount, options)
            .await
    }

    pub async fn sell_limit_order(
        &self,
        pair: &str,
        price: Decimal,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.limit_order(OrderSide::Sell, pair, price, amount, options)
            .await
    }

    pub async fn buy_market_order(
        &self,
        pair: &str,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.amount_order(OrderSide::Buy, "market", pair, amount, options)
            .await
    }

    pub async fn sell_market_order(
        &self,
        pair: &str,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.amount_order(OrderSide::Sell, "market", pair, amount, options)
            .await
    }

    /// Instant buy; `amount` is in the counter currency
    pub async fn buy_instant_order(
        &self,
        pair: &str,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.amount_order(OrderSide::Buy, "instant", pair, amount, options)
            .await
    }

    pub async fn sell_instant_order(
        &self,
        pair: &str,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        self.amount_order(OrderSide::Sell, "instant", pair, amount, options)
            .await
    }

    async fn limit_order(
        &self,
        side: OrderSide,
        pair: &str,
        price: Decimal,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        let (amount, price) = if self.auto_rounding {
            let rounded = (round_amount(pair, amount)?, round_price(pair, price)?);
            debug!(%pair, amount = %rounded.0, price = %rounded.1, "rounded limit order");
            rounded
        } else {
            (amount, price)
        };

        let response: OrderResponse = self
            .client
            .signed_request_json(
                Method::POST,
                &format!("/v2/{}/{}/", side, pair),
                &[],
                RequestBody::Form(limit_order_fields(amount, price, options)),
            )
            .await?;
        reject_on_error(response, || {
            format!("placing limit {} ({} @ {})", side, amount, price)
        })
    }

    async fn amount_order(
        &self,
        side: OrderSide,
        kind: &str,
        pair: &str,
        amount: Decimal,
        options: &OrderOptions,
    ) -> Result<OrderResponse, BitstampError> {
        let response: OrderResponse = self
            .client
            .signed_request_json(
                Method::POST,
                &format!("/v2/{}/{}/{}/", side, kind, pair),
                &[],
                RequestBody::Form(market_order_fields(amount, options)),
            )
            .await?;
        reject_on_error(response, || {
            format!("placing market {} (for {})", side, amount)
        })
    }
}
