//! Signed REST client for Bybit v5 linear perpetuals

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::messages::*;
use crate::common::errors::{BridgeError, Result};
use crate::common::types::Exchange;
use crate::config::types::ExchangeCredentials;
use crate::metadata::types::{
    LeverageSchedule, LeverageTier, MetadataSource, Precision, FALLBACK_MAX_LEVERAGE,
};
use crate::transport::signing::{build_query, BybitAuthHeaders};
use crate::transport::HttpTransport;

/// Bybit REST client bound to one set of credentials
#[derive(Debug, Clone)]
pub struct BybitRestClient<'a> {
    transport: &'a HttpTransport,
    credentials: &'a ExchangeCredentials,
    base_url: String,
}

impl<'a> BybitRestClient<'a> {
    pub fn new(transport: &'a HttpTransport, credentials: &'a ExchangeCredentials) -> Self {
        Self {
            transport,
            credentials,
            base_url: credentials.base_url_for(Exchange::Bybit),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }

    async fn public_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.url(path, &build_query(params));
        debug!("GET {}", url);

        let request = self.transport.client().get(&url);
        let (status, body) = self.transport.execute(request).await?;
        handle_response(status, &body)
    }

    /// Signed GET; the query string is the signed payload
    async fn signed_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let query = build_query(params);
        let headers = BybitAuthHeaders::generate(
            &self.credentials.api_key,
            &self.credentials.api_secret,
            self.transport.recv_window_ms(),
            &query,
        )?;
        debug!(path, "Signed GET");

        let request = headers.apply_to_request(self.transport.client().get(self.url(path, &query)));
        let (status, body) = self.transport.execute(request).await?;
        handle_response(status, &body)
    }

    /// Signed POST; the exact JSON body sent is the signed payload
    async fn signed_post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let payload = serde_json::to_string(body)?;
        let headers = BybitAuthHeaders::generate(
            &self.credentials.api_key,
            &self.credentials.api_secret,
            self.transport.recv_window_ms(),
            &payload,
        )?;
        debug!(path, "Signed POST");

        let request = headers.apply_to_request(
            self.transport
                .client()
                .post(self.url(path, ""))
                .header("Content-Type", "application/json")
                .body(payload),
        );
        let (status, body) = self.transport.execute(request).await?;
        handle_response(status, &body)
    }

    fn symbol_params(symbol: &str) -> Vec<(&'static str, String)> {
        vec![("category", LINEAR.to_string()), ("symbol", symbol.to_string())]
    }

    // ========================================================================
    // Market data
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn instrument_info(&self, symbol: &str) -> Result<Option<InstrumentInfo>> {
        let result: ListResult<InstrumentInfo> = self
            .public_get("/v5/market/instruments-info", &Self::symbol_params(symbol))
            .await?;
        Ok(result.list.into_iter().find(|i| i.symbol == symbol))
    }

    #[instrument(skip(self))]
    pub async fn risk_limits(&self, symbol: &str) -> Result<Vec<RiskLimit>> {
        let result: ListResult<RiskLimit> = self
            .public_get("/v5/market/risk-limit", &Self::symbol_params(symbol))
            .await?;
        Ok(result.list.into_iter().filter(|r| r.symbol == symbol).collect())
    }

    /// Last traded price
    #[instrument(skip(self))]
    pub async fn ticker_price(&self, symbol: &str) -> Result<Decimal> {
        let result: ListResult<Ticker> = self
            .public_get("/v5/market/tickers", &Self::symbol_params(symbol))
            .await?;
        result
            .list
            .into_iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.last_price)
            .ok_or_else(|| BridgeError::InvalidResponse(format!("No ticker for {}", symbol)))
    }

    // ========================================================================
    // Account and positions
    // ========================================================================

    /// Unified-account wallet balance of `coin`
    #[instrument(skip(self))]
    pub async fn wallet_balance(&self, coin: &str) -> Result<Decimal> {
        let result: ListResult<WalletAccount> = self
            .signed_get(
                "/v5/account/wallet-balance",
                &[("accountType", "UNIFIED".to_string()), ("coin", coin.to_string())],
            )
            .await?;
        Ok(result
            .list
            .iter()
            .flat_map(|account| account.coin.iter())
            .find(|c| c.coin == coin)
            .map(WalletCoin::balance)
            .unwrap_or(Decimal::ZERO))
    }

    /// The first position on `symbol` with a non-zero size, if any
    #[instrument(skip(self))]
    pub async fn position(&self, symbol: &str) -> Result<Option<PositionInfo>> {
        let result: ListResult<PositionInfo> = self
            .signed_get("/v5/position/list", &Self::symbol_params(symbol))
            .await?;
        Ok(result.list.into_iter().find(PositionInfo::is_open))
    }

    #[instrument(skip(self))]
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let _: serde_json::Value = self
            .signed_post("/v5/position/set-leverage", &SetLeverageRequest::new(symbol, leverage))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(symbol = %request.symbol))]
    pub async fn set_trading_stop(&self, request: &TradingStopRequest) -> Result<()> {
        let _: serde_json::Value = self.signed_post("/v5/position/trading-stop", request).await?;
        Ok(())
    }

    // ========================================================================
    // Orders
    // ========================================================================

    #[instrument(skip(self, order), fields(symbol = %order.symbol))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> Result<String> {
        let result: serde_json::Value = self.signed_post("/v5/order/create", order).await?;
        let order_id = result
            .get("orderId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        debug!(order_id = %order_id, "Order accepted");
        Ok(order_id)
    }

    #[instrument(skip(self))]
    pub async fn cancel_all(&self, symbol: &str) -> Result<()> {
        let _: serde_json::Value = self
            .signed_post("/v5/order/cancel-all", &CancelAllRequest::new(symbol))
            .await?;
        Ok(())
    }
}

/// Unwrap the v5 envelope, surfacing `retCode != 0` verbatim
pub fn handle_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let envelope: BybitResponse<serde_json::Value> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(e.into()),
        Err(_) => {
            return Err(BridgeError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )))
        }
    };

    if envelope.ret_code != 0 {
        return Err(BridgeError::exchange(envelope.ret_code, envelope.ret_msg));
    }

    let result = envelope.result.unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(result)?)
}

#[async_trait]
impl MetadataSource for BybitRestClient<'_> {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_precision(&self, symbol: &str) -> Result<Vec<(String, Precision)>> {
        let info = self.instrument_info(symbol).await?;
        Ok(info
            .into_iter()
            .map(|i| {
                let precision = Precision::new(i.price_filter.tick_size, i.lot_size_filter.qty_step);
                (i.symbol, precision)
            })
            .collect())
    }

    /// Risk-limit tiers, or a single tier from the instrument's leverage
    /// filter when the exchange lists none
    async fn fetch_leverage(&self, symbol: &str) -> Result<LeverageSchedule> {
        let tiers: Vec<LeverageTier> = self
            .risk_limits(symbol)
            .await?
            .into_iter()
            .filter_map(|r| {
                let leverage = r.max_leverage.floor().to_u32()?;
                Some(LeverageTier::new(r.risk_limit_value, leverage))
            })
            .collect();

        if !tiers.is_empty() {
            return Ok(LeverageSchedule::new(tiers));
        }

        let info = self.instrument_info(symbol).await?;
        Ok(info
            .and_then(|i| i.leverage_filter.max_leverage.floor().to_u32())
            .map(LeverageSchedule::flat)
            .unwrap_or_default())
    }

    fn default_precision(&self) -> Precision {
        Precision::fallback()
    }

    fn default_leverage(&self) -> LeverageSchedule {
        LeverageSchedule::flat(FALLBACK_MAX_LEVERAGE)
    }
}
