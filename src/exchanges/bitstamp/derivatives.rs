use crate::core::errors::BitstampError;
use crate::core::kernel::{RequestBody, RestClient};
use crate::exchanges::bitstamp::rest::BitstampRestClient;
use crate::exchanges::bitstamp::types::{
    ClosePositionOrderType, ClosePositionsResult, CollateralAdjustment, CollateralCurrency,
    LeverageSetting, MarginInfo, MarginMode, OpenPosition, PositionSummary, SettlementFilter,
    SettlementTransaction, Sort,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;

pub const MAX_SETTLEMENT_OFFSET: u32 = 200_000;
pub const MAX_SETTLEMENT_LIMIT: u32 = 1000;
const DEFAULT_SETTLEMENT_LIMIT: u32 = 100;

#[derive(Serialize)]
struct ClosePositionRequest<'a> {
    position_id: &'a str,
}

#[derive(Serialize)]
struct ClosePositionsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    margin_mode: Option<MarginMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market: Option<&'a str>,
    order_type: ClosePositionOrderType,
}

#[derive(Serialize)]
struct AdjustCollateralRequest<'a> {
    position_id: &'a str,
    new_amount: Decimal,
}

#[derive(Serialize)]
struct UpdateLeverageRequest<'a> {
    leverage: Decimal,
    margin_mode: MarginMode,
    market: &'a str,
}

fn json_body<T: Serialize>(payload: &T) -> Result<RequestBody, BitstampError> {
    Ok(RequestBody::Json(serde_json::to_value(payload)?))
}

fn require_position_id(position_id: &str) -> Result<(), BitstampError> {
    if position_id.is_empty() {
        return Err(BitstampError::InvalidParameters(
            "positionId is required".to_string(),
        ));
    }
    Ok(())
}

/// `base` with an optional extra path segment
fn with_segment(base: &str, segment: Option<&str>) -> String {
    match segment.filter(|s| !s.is_empty()) {
        Some(segment) => format!("{}{}/", base, segment),
        None => base.to_string(),
    }
}

impl<R: RestClient> BitstampRestClient<R> {
    pub async fn open_positions(
        &self,
        market: Option<&str>,
    ) -> Result<Vec<OpenPosition>, BitstampError> {
        self.client
            .signed_request_json(
                Method::GET,
                &with_segment("/v2/open_positions/", market),
                &[],
                RequestBody::Empty,
            )
            .await
    }

    /// `None` when the exchange acknowledges with an empty body
    pub async fn close_position(
        &self,
        position_id: &str,
    ) -> Result<Option<PositionSummary>, BitstampError> {
        require_position_id(position_id)?;
        let body = json_body(&ClosePositionRequest { position_id })?;
        self.client
            .signed_request_json(Method::POST, "/v2/close_position/", &[], body)
            .await
    }

    /// Close every position matching the optional margin mode and market
    pub async fn close_positions(
        &self,
        order_type: ClosePositionOrderType,
        margin_mode: Option<MarginMode>,
        market: Option<&str>,
    ) -> Result<ClosePositionsResult, BitstampError> {
        let body = json_body(&ClosePositionsRequest {
            margin_mode,
            market,
            order_type,
        })?;
        self.client
            .signed_request_json(Method::POST, "/v2/close_positions/", &[], body)
            .await
    }

    pub async fn margin_info(&self) -> Result<MarginInfo, BitstampError> {
        self.client
            .signed_request_json(
                Method::GET,
                "/v2/margin_info/",
                &[],
                RequestBody::Json(serde_json::Value::Null),
            )
            .await
    }

    /// Closed and settled positions, newest first unless `sort` says otherwise
    pub async fn position_history(
        &self,
        market: Option<&str>,
        sort: Option<Sort>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Vec<PositionSummary>, BitstampError> {
        let sort = sort.unwrap_or_default();
        let page = page.unwrap_or(1).to_string();
        let per_page = per_page.map(|p| p.to_string());

        let mut params = vec![("sort", sort.as_str()), ("page", page.as_str())];
        if let Some(per_page) = &per_page {
            params.push(("per_page", per_page.as_str()));
        }

        self.client
            .signed_request_json(
                Method::GET,
                &with_segment("/v2/position_history/", market),
                &params,
                RequestBody::Json(serde_json::Value::Null),
            )
            .await
    }

    pub async fn settlement_transactions(
        &self,
        filter: &SettlementFilter,
    ) -> Result<Vec<SettlementTransaction>, BitstampError> {
        let offset = filter.offset.unwrap_or(0);
        if offset > MAX_SETTLEMENT_OFFSET {
            return Err(BitstampError::InvalidParameters(format!(
                "invalid offset: {}",
                offset
            )));
        }
        let limit = filter.limit.unwrap_or(DEFAULT_SETTLEMENT_LIMIT);
        if limit > MAX_SETTLEMENT_LIMIT {
            return Err(BitstampError::InvalidParameters(format!(
                "invalid limit: {}",
                limit
            )));
        }

        let offset = offset.to_string();
        let limit = limit.to_string();
        let since_timestamp = filter.since_timestamp.map(|t| t.to_string());
        let until_timestamp = filter.until_timestamp.map(|t| t.to_string());
        let since_id = filter.since_id.map(|id| id.to_string());

        let mut params = vec![
            ("offset", offset.as_str()),
            ("limit", limit.as_str()),
            ("sort", filter.sort.unwrap_or_default().as_str()),
        ];
        if let Some(value) = &since_timestamp {
            params.push(("since_timestamp", value.as_str()));
        }
        if let Some(value) = &until_timestamp {
            params.push(("until_timestamp", value.as_str()));
        }
        if let Some(value) = &since_id {
            params.push(("since_id", value.as_str()));
        }

        self.client
            .signed_request_json(
                Method::GET,
                &with_segment(
                    "/v2/position_settlement_transactions/",
                    filter.market.as_deref(),
                ),
                &params,
                RequestBody::Json(serde_json::Value::Null),
            )
            .await
    }

    /// Move collateral in or out of an isolated position
    pub async fn adjust_position_collateral(
        &self,
        position_id: &str,
        new_amount: Decimal,
    ) -> Result<CollateralAdjustment, BitstampError> {
        require_position_id(position_id)?;
        let body = json_body(&AdjustCollateralRequest {
            position_id,
            new_amount,
        })?;
        self.client
            .signed_request_json(Method::POST, "/v2/adjust_position_collateral/", &[], body)
            .await
    }

    pub async fn collateral_currencies(&self) -> Result<Vec<CollateralCurrency>, BitstampError> {
        self.client
            .signed_request_json(
                Method::GET,
                "/v2/collateral_currencies/",
                &[],
                RequestBody::Json(serde_json::Value::Null),
            )
            .await
    }

    pub async fn leverage_settings(
        &self,
        margin_mode: MarginMode,
        market: &str,
    ) -> Result<Vec<LeverageSetting>, BitstampError> {
        self.client
            .signed_request_json(
                Method::GET,
                "/v2/leverage_settings/",
                &[("margin_mode", margin_mode.as_str()), ("market", market)],
                RequestBody::Json(serde_json::Value::Null),
            )
            .await
    }

    /// `None` when the exchange acknowledges with an empty body
    pub async fn update_leverage_setting(
        &self,
        leverage: Decimal,
        margin_mode: MarginMode,
        market: &str,
    ) -> Result<Option<LeverageSetting>, BitstampError> {
        let body = json_body(&UpdateLeverageRequest {
            leverage,
            margin_mode,
            market,
        })?;
        self.client
            .signed_request_json(Method::POST, "/v2/leverage_settings/", &[], body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_with_segment() {
        assert_eq!(with_segment("/v2/open_positions/", None), "/v2/open_positions/");
        assert_eq!(with_segment("/v2/open_positions/", Some("")), "/v2/open_positions/");
        assert_eq!(
            with_segment("/v2/open_positions/", Some("BTC-USD-PERP")),
            "/v2/open_positions/BTC-USD-PERP/"
        );
    }

    #[test]
    fn test_close_positions_body_skips_unset_filters() {
        let body = json_body(&ClosePositionsRequest {
            margin_mode: None,
            market: None,
            order_type: ClosePositionOrderType::Market,
        })
        .unwrap();
        assert_eq!(body, RequestBody::Json(json!({"order_type": "MARKET"})));

        let body = json_body(&ClosePositionsRequest {
            margin_mode: Some(MarginMode::Isolated),
            market: Some("BTC-USD-PERP"),
            order_type: ClosePositionOrderType::Market,
        })
        .unwrap();
        assert_eq!(
            body,
            RequestBody::Json(json!({
                "margin_mode": "ISOLATED",
                "market": "BTC-USD-PERP",
                "order_type": "MARKET"
            }))
        );
    }

    #[test]
    fn test_adjust_collateral_body() {
        let body = json_body(&AdjustCollateralRequest {
            position_id: "p1",
            new_amount: Decimal::from_str("12.5").unwrap(),
        })
        .unwrap();
        assert_eq!(
            body,
            RequestBody::Json(json!({"position_id": "p1", "new_amount": "12.5"}))
        );
    }

    #[test]
    fn test_require_position_id() {
        let err = require_position_id("").unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters: positionId is required");
        assert!(require_position_id("p1").is_ok());
    }
}
