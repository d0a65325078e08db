//! Bybit v5 request and response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{OrderType, Side};

/// Product category for USDT perpetuals
pub const LINEAR: &str = "linear";

/// Every v5 response is wrapped in this envelope; `ret_code != 0` is a rejection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

/// Paged result wrapper used by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

// ============================================================================
// Market data
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub symbol: String,
    pub price_filter: PriceFilter,
    pub lot_size_filter: LotSizeFilter,
    pub leverage_filter: LeverageFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    pub tick_size: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    pub qty_step: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageFilter {
    pub max_leverage: Decimal,
}

/// One tier of `/v5/market/risk-limit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskLimit {
    pub symbol: String,
    pub risk_limit_value: Decimal,
    pub max_leverage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_price: Decimal,
}

// ============================================================================
// Account and positions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAccount {
    #[serde(default)]
    pub coin: Vec<WalletCoin>,
}

/// Balance fields may be empty strings, so they stay raw until parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCoin {
    pub coin: String,
    #[serde(default)]
    pub wallet_balance: String,
}

impl WalletCoin {
    pub fn balance(&self) -> Decimal {
        self.wallet_balance.trim().parse().unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    pub symbol: String,
    /// `Buy`, `Sell`, or empty when flat
    #[serde(default)]
    pub side: String,
    pub size: Decimal,
    #[serde(default)]
    pub position_idx: i32,
}

impl PositionInfo {
    pub fn is_open(&self) -> bool {
        self.size > Decimal::ZERO
    }

    /// Side that reduces this position
    pub fn closing_side(&self) -> BybitSide {
        if self.side == "Buy" {
            BybitSide::Sell
        } else {
            BybitSide::Buy
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BybitSide {
    Buy,
    Sell,
}

impl From<Side> for BybitSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => BybitSide::Buy,
            Side::Short => BybitSide::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BybitOrderType {
    Market,
    Limit,
}

impl From<OrderType> for BybitOrderType {
    fn from(order_type: OrderType) -> Self {
        match order_type {
            OrderType::Market => BybitOrderType::Market,
            OrderType::Limit => BybitOrderType::Limit,
        }
    }
}

/// `POST /v5/order/create`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub category: &'static str,
    pub symbol: String,
    pub side: BybitSide,
    pub order_type: BybitOrderType,
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
}

impl CreateOrderRequest {
    pub fn market(symbol: &str, side: BybitSide, qty: Decimal) -> Self {
        Self {
            category: LINEAR,
            symbol: symbol.to_string(),
            side,
            order_type: BybitOrderType::Market,
            qty: qty.to_string(),
            price: None,
            time_in_force: None,
            take_profit: None,
            stop_loss: None,
            reduce_only: None,
        }
    }

    pub fn limit(symbol: &str, side: BybitSide, qty: Decimal, price: Decimal) -> Self {
        Self {
            order_type: BybitOrderType::Limit,
            price: Some(price.to_string()),
            time_in_force: Some("GTC"),
            ..Self::market(symbol, side, qty)
        }
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price.to_string());
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price.to_string());
        self
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = Some(true);
        self
    }
}

/// `POST /v5/position/set-leverage`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageRequest {
    pub category: &'static str,
    pub symbol: String,
    pub buy_leverage: String,
    pub sell_leverage: String,
}

impl SetLeverageRequest {
    pub fn new(symbol: &str, leverage: u32) -> Self {
        Self {
            category: LINEAR,
            symbol: symbol.to_string(),
            buy_leverage: leverage.to_string(),
            sell_leverage: leverage.to_string(),
        }
    }
}

/// Value that removes a TP or SL in a trading-stop request
pub const CLEAR_TRIGGER: &str = "0";

/// `POST /v5/position/trading-stop`; absent fields leave that trigger as is
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStopRequest {
    pub category: &'static str,
    pub symbol: String,
    pub position_idx: i32,
    pub tpsl_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<String>,
}

impl TradingStopRequest {
    pub fn new(symbol: &str, position_idx: i32) -> Self {
        Self {
            category: LINEAR,
            symbol: symbol.to_string(),
            position_idx,
            tpsl_mode: "Full",
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.take_profit.is_none() && self.stop_loss.is_none()
    }
}

/// `POST /v5/order/cancel-all`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelAllRequest {
    pub category: &'static str,
    pub symbol: String,
}

impl CancelAllRequest {
    pub fn new(symbol: &str) -> Self {
        Self {
            category: LINEAR,
            symbol: symbol.to_string(),
        }
    }
}
