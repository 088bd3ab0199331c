use crate::core::errors::BitstampError;
use crate::core::kernel::{RequestBody, RestClient};
use crate::exchanges::bitstamp::rest::BitstampRestClient;
use crate::exchanges::bitstamp::types::{
    AccountBalance, Balance, CryptoAddress, CryptoTransactions, TradingFee, UserTransaction,
    WebsocketsToken, WithdrawalFee, WithdrawalRequest,
};
use reqwest::Method;

const ALL: &str = "all";

fn pair_path(prefix: &str, pair_or_all: &str) -> String {
    if pair_or_all.is_empty() || pair_or_all == ALL {
        format!("{}/", prefix)
    } else {
        format!("{}/{}/", prefix, pair_or_all)
    }
}

impl<R: RestClient> BitstampRestClient<R> {
    /// Balances, reserves and fees for every currency or a single pair
    ///
    /// Pass `"all"` (or an empty string) for the full account.
    pub async fn balance(&self, pair_or_all: &str) -> Result<Balance, BitstampError> {
        self.client
            .signed_request_json(
                Method::POST,
                &pair_path("/v2/balance", pair_or_all),
                &[],
                RequestBody::Empty,
            )
            .await
    }

    pub async fn account_balances(&self) -> Result<Vec<AccountBalance>, BitstampError> {
        self.client
            .signed_request_json(Method::POST, "/v2/account_balances/", &[], RequestBody::Empty)
            .await
    }

    /// The latest 1000 account transactions
    pub async fn user_transactions(
        &self,
        pair_or_all: &str,
    ) -> Result<Vec<UserTransaction>, BitstampError> {
        self.client
            .signed_request_json(
                Method::POST,
                &pair_path("/v2/user_transactions", pair_or_all),
                &[],
                RequestBody::form(&[("limit", "1000")]),
            )
            .await
    }

    pub async fn crypto_transactions(
        &self,
        include_ious: bool,
    ) -> Result<CryptoTransactions, BitstampError> {
        let mut params = vec![("limit", "1000")];
        if include_ious {
            params.push(("include_ious", ""));
        }

        self.client
            .signed_request_json(
                Method::POST,
                "/v2/crypto-transactions/",
                &[],
                RequestBody::form(&params),
            )
            .await
    }

    /// Deposit address for a currency (`btc`, `eth`, ...)
    pub async fn crypto_address(&self, currency: &str) -> Result<CryptoAddress, BitstampError> {
        if currency.is_empty() {
            return Err(BitstampError::InvalidParameters(
                "currency is required".to_string(),
            ));
        }

        self.client
            .signed_request_json(
                Method::POST,
                &format!("/v2/{}_address/", currency.to_lowercase()),
                &[],
                RequestBody::Empty,
            )
            .await
    }

    /// Withdrawal requests, optionally narrowed to one id or a time window
    ///
    /// `timedelta` is a number of seconds counted back from now.
    pub async fn withdrawal_requests(
        &self,
        id: Option<i64>,
        timedelta: Option<u64>,
    ) -> Result<Vec<WithdrawalRequest>, BitstampError> {
        let id = id.filter(|id| *id != 0).map(|id| id.to_string());
        let timedelta = timedelta.map(|t| t.to_string());

        let mut params = vec![("offset", "0"), ("limit", "1000")];
        if let Some(id) = &id {
            params.push(("id", id.as_str()));
        }
        if let Some(timedelta) = &timedelta {
            params.push(("timedelta", timedelta.as_str()));
        }

        self.client
            .signed_request_json(
                Method::POST,
                "/v2/withdrawal-requests/",
                &[],
                RequestBody::form(&params),
            )
            .await
    }

    pub async fn withdrawal_fees(&self) -> Result<Vec<WithdrawalFee>, BitstampError> {
        self.client
            .signed_request_json(Method::POST, "/v2/fees/withdrawal/", &[], RequestBody::Empty)
            .await
    }

    pub async fn trading_fees(&self) -> Result<Vec<TradingFee>, BitstampError> {
        self.client
            .signed_request_json(Method::POST, "/v2/fees/trading/", &[], RequestBody::Empty)
            .await
    }

    /// Short-lived token for subscribing to private WebSocket channels
    pub async fn websockets_token(&self) -> Result<WebsocketsToken, BitstampError> {
        self.client
            .signed_request_json(Method::POST, "/v2/websockets_token/", &[], RequestBody::Empty)
            .await
    }

    /// Balance through form credentials (`key`, `signature`, `nonce` fields)
    pub async fn legacy_balance(&self, pair_or_all: &str) -> Result<Balance, BitstampError> {
        self.client
            .legacy_post_form(&pair_path("/v2/balance", pair_or_all), &[])
            .await
    }
}
