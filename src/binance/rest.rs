//! Signed REST client for Binance USDⓈ-M futures

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::messages::*;
use crate::common::errors::{BridgeError, Result};
use crate::common::types::Exchange;
use crate::config::types::ExchangeCredentials;
use crate::metadata::types::{
    LeverageSchedule, LeverageTier, MetadataSource, Precision, FALLBACK_MAX_LEVERAGE,
    FALLBACK_STEP_SIZE, FALLBACK_TICK_SIZE,
};
use crate::transport::signing::{binance_signed_query, build_query, timestamp_ms};
use crate::transport::HttpTransport;

/// Binance REST client bound to one set of credentials
///
/// Built per operation; the transport's connection pool is shared.
#[derive(Debug, Clone)]
pub struct BinanceRestClient<'a> {
    transport: &'a HttpTransport,
    credentials: &'a ExchangeCredentials,
    base_url: String,
}

impl<'a> BinanceRestClient<'a> {
    pub fn new(transport: &'a HttpTransport, credentials: &'a ExchangeCredentials) -> Self {
        Self {
            transport,
            credentials,
            base_url: credentials.base_url_for(Exchange::Binance),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    async fn public_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = if params.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, build_query(params))
        };
        debug!("GET {}", url);

        let request = self.transport.client().get(&url);
        let (status, body) = self.transport.execute(request).await?;
        handle_response(status, &body)
    }

    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = binance_signed_query(
            &self.credentials.api_secret,
            params,
            self.transport.recv_window_ms(),
            timestamp_ms(),
        )?;
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!(%method, path, "Signed request");

        let request = self
            .transport
            .client()
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.credentials.api_key);
        let (status, body) = self.transport.execute(request).await?;
        handle_response(status, &body)
    }

    async fn signed_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        self.signed_request(Method::GET, path, params).await
    }

    async fn signed_post<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        self.signed_request(Method::POST, path, params).await
    }

    async fn signed_delete<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        self.signed_request(Method::DELETE, path, params).await
    }

    // ========================================================================
    // Market data
    // ========================================================================

    /// Full instrument catalog
    #[instrument(skip(self))]
    pub async fn exchange_info(&self) -> Result<Vec<SymbolInfo>> {
        let info: ExchangeInfoResponse = self.public_get("/fapi/v1/exchangeInfo", &[]).await?;
        Ok(info.symbols)
    }

    /// Last traded price
    #[instrument(skip(self))]
    pub async fn ticker_price(&self, symbol: &str) -> Result<Decimal> {
        let ticker: TickerPrice = self
            .public_get("/fapi/v1/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        Ok(ticker.price)
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// Notional brackets for a symbol (requires a signed request)
    #[instrument(skip(self))]
    pub async fn leverage_brackets(&self, symbol: &str) -> Result<Vec<Bracket>> {
        let response: LeverageBracketResponse = self
            .signed_get("/fapi/v1/leverageBracket", &[("symbol", symbol.to_string())])
            .await?;
        Ok(response.into_brackets(symbol))
    }

    /// Available balance of `asset`; zero when the account holds none
    #[instrument(skip(self))]
    pub async fn available_balance(&self, asset: &str) -> Result<Decimal> {
        let balances: Vec<AssetBalance> = self.signed_get("/fapi/v2/balance", &[]).await?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map(|b| b.available_balance)
            .unwrap_or(Decimal::ZERO))
    }

    #[instrument(skip(self))]
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let _: serde_json::Value = self
            .signed_post(
                "/fapi/v1/leverage",
                &[("symbol", symbol.to_string()), ("leverage", leverage.to_string())],
            )
            .await?;
        Ok(())
    }

    /// The first non-zero position on `symbol`, if any
    #[instrument(skip(self))]
    pub async fn position(&self, symbol: &str) -> Result<Option<PositionRisk>> {
        let positions: Vec<PositionRisk> = self
            .signed_get("/fapi/v2/positionRisk", &[("symbol", symbol.to_string())])
            .await?;
        Ok(positions
            .into_iter()
            .find(|p| p.symbol == symbol && p.is_open()))
    }

    // ========================================================================
    // Orders
    // ========================================================================

    #[instrument(skip(self, order), fields(symbol = %order.symbol))]
    pub async fn place_order(&self, order: &NewOrderRequest) -> Result<OrderResponse> {
        let response: OrderResponse = self.signed_post("/fapi/v1/order", &order.to_params()).await?;
        debug!(order_id = response.order_id, "Order accepted");
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>> {
        self.signed_get("/fapi/v1/openOrders", &[("symbol", symbol.to_string())])
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<()> {
        let _: serde_json::Value = self
            .signed_delete(
                "/fapi/v1/order",
                &[("symbol", symbol.to_string()), ("orderId", order_id.to_string())],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn cancel_all(&self, symbol: &str) -> Result<()> {
        let _: serde_json::Value = self
            .signed_delete("/fapi/v1/allOpenOrders", &[("symbol", symbol.to_string())])
            .await?;
        Ok(())
    }
}

/// Turn a raw Binance response into `T`, surfacing `{code, msg}` rejections
/// verbatim
///
/// Some endpoints acknowledge success with `{"code": 200, "msg": ...}`, so
/// only negative codes are errors.
pub fn handle_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if let Ok(error) = serde_json::from_str::<BinanceApiError>(body) {
        if error.code < 0 {
            return Err(BridgeError::exchange(error.code, error.msg));
        }
    }

    if !status.is_success() {
        return Err(BridgeError::InvalidResponse(format!(
            "Server returned status {}: {}",
            status, body
        )));
    }

    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl MetadataSource for BinanceRestClient<'_> {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    /// Binance only serves the whole catalog, so every symbol is returned
    async fn fetch_precision(&self, _symbol: &str) -> Result<Vec<(String, Precision)>> {
        let symbols = self.exchange_info().await?;
        Ok(symbols
            .into_iter()
            .map(|info| {
                let precision = Precision::new(
                    info.tick_size().unwrap_or(FALLBACK_TICK_SIZE),
                    info.step_size().unwrap_or(FALLBACK_STEP_SIZE),
                );
                (info.symbol, precision)
            })
            .collect())
    }

    async fn fetch_leverage(&self, symbol: &str) -> Result<LeverageSchedule> {
        let brackets = self.leverage_brackets(symbol).await?;
        Ok(LeverageSchedule::new(
            brackets
                .into_iter()
                .map(|b| LeverageTier::new(b.notional_cap, b.initial_leverage))
                .collect(),
        ))
    }

    fn default_precision(&self) -> Precision {
        Precision::fallback()
    }

    fn default_leverage(&self) -> LeverageSchedule {
        LeverageSchedule::flat(FALLBACK_MAX_LEVERAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_code_is_exchange_error() {
        let body = r#"{"code": -2019, "msg": "Margin is insufficient."}"#;
        let result: Result<serde_json::Value> = handle_response(StatusCode::BAD_REQUEST, body);

        match result {
            Err(BridgeError::Exchange { code, message }) => {
                assert_eq!(code, -2019);
                assert_eq!(message, "Margin is insufficient.");
            }
            other => panic!("Expected exchange error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_code_is_not_an_error() {
        let body = r#"{"code": 200, "msg": "The operation of cancel all open order is done."}"#;
        let result: Result<serde_json::Value> = handle_response(StatusCode::OK, body);
        assert!(result.is_ok());
    }

    #[test]
    fn test_non_json_failure_status() {
        let result: Result<serde_json::Value> =
            handle_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(result, Err(BridgeError::InvalidResponse(_))));
    }

    #[test]
    fn test_client_uses_configured_base_url() {
        let transport = HttpTransport::new().unwrap();
        let creds = ExchangeCredentials::new("key", "secret").with_base_url("http://localhost:9000/");
        let client = BinanceRestClient::new(&transport, &creds);
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
