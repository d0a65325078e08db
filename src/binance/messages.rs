//! Binance USDⓈ-M futures request and response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::Side;

/// Error envelope returned by Binance (`{"code": -2019, "msg": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceApiError {
    pub code: i64,
    pub msg: String,
}

/// Response from `/fapi/v1/exchangeInfo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeInfoResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// One entry of a symbol's `filters` array; only price and lot filters matter here
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default)]
    pub step_size: Option<Decimal>,
}

impl SymbolInfo {
    pub fn tick_size(&self) -> Option<Decimal> {
        self.filters
            .iter()
            .find(|f| f.filter_type == "PRICE_FILTER")
            .and_then(|f| f.tick_size)
    }

    pub fn step_size(&self) -> Option<Decimal> {
        self.filters
            .iter()
            .find(|f| f.filter_type == "LOT_SIZE")
            .and_then(|f| f.step_size)
    }
}

/// `/fapi/v1/leverageBracket` returns an array, or a single object when
/// queried for one symbol on some API versions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeverageBracketResponse {
    Many(Vec<SymbolBrackets>),
    One(SymbolBrackets),
}

impl LeverageBracketResponse {
    pub fn into_brackets(self, symbol: &str) -> Vec<Bracket> {
        match self {
            LeverageBracketResponse::One(entry) => entry.brackets,
            LeverageBracketResponse::Many(entries) => entries
                .into_iter()
                .find(|e| e.symbol == symbol)
                .map(|e| e.brackets)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolBrackets {
    pub symbol: String,
    #[serde(default)]
    pub brackets: Vec<Bracket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub bracket: u32,
    pub initial_leverage: u32,
    pub notional_cap: Decimal,
    #[serde(default)]
    pub notional_floor: Decimal,
}

/// Response from `/fapi/v1/ticker/price`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

/// Entry of `/fapi/v2/balance`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub asset: String,
    pub available_balance: Decimal,
}

/// Entry of `/fapi/v2/positionRisk`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    pub symbol: String,
    pub position_amt: Decimal,
    #[serde(default)]
    pub position_side: Option<String>,
}

impl PositionRisk {
    pub fn is_open(&self) -> bool {
        !self.position_amt.is_zero()
    }

    /// Side that reduces this position
    pub fn closing_side(&self) -> OrderSide {
        if self.position_amt > Decimal::ZERO {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        }
    }
}

/// Entry of `/fapi/v1/openOrders`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub order_id: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub side: Option<String>,
}

/// Response from `POST /fapi/v1/order`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl From<Side> for OrderSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        }
    }
}

/// Which protective trigger an order represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    TakeProfit,
    StopLoss,
}

impl TriggerKind {
    /// Whether an existing open order of `order_type` is this kind of trigger
    pub fn matches(self, order_type: &str) -> bool {
        match self {
            TriggerKind::TakeProfit => order_type.contains("TAKE_PROFIT"),
            TriggerKind::StopLoss => order_type.contains("STOP"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceOrderType {
    Market,
    Limit,
    TakeProfitMarket,
    StopMarket,
}

impl BinanceOrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            BinanceOrderType::Market => "MARKET",
            BinanceOrderType::Limit => "LIMIT",
            BinanceOrderType::TakeProfitMarket => "TAKE_PROFIT_MARKET",
            BinanceOrderType::StopMarket => "STOP_MARKET",
        }
    }
}

/// Typed `POST /fapi/v1/order` request; optional fields are only sent when set
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: BinanceOrderType,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<&'static str>,
    pub reduce_only: bool,
    pub close_position: bool,
    pub working_type: Option<&'static str>,
}

impl NewOrderRequest {
    fn base(symbol: &str, side: OrderSide, order_type: BinanceOrderType) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type,
            quantity: None,
            price: None,
            stop_price: None,
            time_in_force: None,
            reduce_only: false,
            close_position: false,
            working_type: None,
        }
    }

    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::base(symbol, side, BinanceOrderType::Market)
        }
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            quantity: Some(quantity),
            price: Some(price),
            time_in_force: Some("GTC"),
            ..Self::base(symbol, side, BinanceOrderType::Limit)
        }
    }

    /// Conditional market order that closes the whole position when triggered
    pub fn trigger(symbol: &str, side: OrderSide, kind: TriggerKind, stop_price: Decimal) -> Self {
        let order_type = match kind {
            TriggerKind::TakeProfit => BinanceOrderType::TakeProfitMarket,
            TriggerKind::StopLoss => BinanceOrderType::StopMarket,
        };
        Self {
            stop_price: Some(stop_price),
            close_position: true,
            working_type: Some("MARK_PRICE"),
            ..Self::base(symbol, side, order_type)
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    /// Query parameters in submission order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
        ];
        if let Some(quantity) = self.quantity {
            params.push(("quantity", quantity.to_string()));
        }
        if let Some(price) = self.price {
            params.push(("price", price.to_string()));
        }
        if let Some(tif) = self.time_in_force {
            params.push(("timeInForce", tif.to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice", stop_price.to_string()));
        }
        if self.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }
        if self.close_position {
            params.push(("closePosition", "true".to_string()));
        }
        if let Some(working_type) = self.working_type {
            params.push(("workingType", working_type.to_string()));
        }
        params
    }
}
