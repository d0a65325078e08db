//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use trade_mirror::common::types::{Exchange, ExecutionOutcome, Notification, TradeAction, TradeIntent};
use trade_mirror::config::types::{AppSettings, BridgeConfig, ExchangeCredentials, GlobalSizingConfig};
use trade_mirror::symbol::normalize_for;
use trade_mirror::{BridgeError, ExchangeAdapter, HttpTransport, Notifier, Result};

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";

/// Credentials pointing at a mock server
pub fn credentials(base_url: &str) -> ExchangeCredentials {
    ExchangeCredentials::new(API_KEY, API_SECRET).with_base_url(base_url)
}

/// 100 USDT margin at up to 10x
pub fn fixed_sizing() -> GlobalSizingConfig {
    GlobalSizingConfig::fixed(dec!(100), 10)
}

pub fn test_transport() -> HttpTransport {
    HttpTransport::with_timeout(Duration::from_secs(5)).expect("Failed to create transport")
}

/// Config with the given exchanges active
pub fn config_with(exchanges: &[Exchange]) -> BridgeConfig {
    let exchanges: BTreeMap<Exchange, ExchangeCredentials> = exchanges
        .iter()
        .map(|e| (*e, ExchangeCredentials::new(API_KEY, API_SECRET)))
        .collect();

    BridgeConfig {
        exchanges,
        global: fixed_sizing(),
        settings: AppSettings::default(),
    }
}

pub fn btc_long() -> TradeIntent {
    TradeIntent::new("BINANCE:BTCUSDT.P").with_side(trade_mirror::Side::Long)
}

// ============================================================================
// Notification capture
// ============================================================================

/// Notifier that keeps every notification in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent.lock().unwrap().push(Notification::new(title, message));
    }
}

// ============================================================================
// Scripted exchange adapter
// ============================================================================

/// How a scripted adapter answers every call
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Succeed,
    Reject(i64, &'static str),
    TooSmall,
}

/// Adapter that records calls and answers from a script
pub struct ScriptedAdapter {
    exchange: Exchange,
    script: Script,
    calls: Mutex<Vec<TradeAction>>,
}

impl ScriptedAdapter {
    pub fn new(exchange: Exchange, script: Script) -> Self {
        Self {
            exchange,
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TradeAction> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, action: TradeAction, intent: &TradeIntent) -> Result<ExecutionOutcome> {
        self.calls.lock().unwrap().push(action);
        let symbol = normalize_for(self.exchange, &intent.symbol);

        match self.script {
            Script::Reject(code, message) => Err(BridgeError::exchange(code, message)),
            Script::TooSmall => Err(BridgeError::QuantityTooSmall { symbol }),
            Script::Succeed => Ok(match action {
                TradeAction::Open | TradeAction::Edit => ExecutionOutcome::Opened {
                    symbol,
                    side: intent.side.unwrap_or(trade_mirror::Side::Long),
                    quantity: dec!(0.025),
                    leverage: 10,
                },
                TradeAction::ModifyPosition => ExecutionOutcome::Modified { symbol },
                TradeAction::Close => ExecutionOutcome::Closed { symbol },
                TradeAction::Cancel => ExecutionOutcome::Canceled { symbol },
            }),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for ScriptedAdapter {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn open(
        &self,
        intent: &TradeIntent,
        _credentials: &ExchangeCredentials,
        _global: &GlobalSizingConfig,
    ) -> Result<ExecutionOutcome> {
        self.answer(TradeAction::Open, intent)
    }

    async fn modify(&self, intent: &TradeIntent, _credentials: &ExchangeCredentials) -> Result<ExecutionOutcome> {
        self.answer(TradeAction::ModifyPosition, intent)
    }

    async fn close(&self, intent: &TradeIntent, _credentials: &ExchangeCredentials) -> Result<ExecutionOutcome> {
        self.answer(TradeAction::Close, intent)
    }

    async fn cancel(&self, intent: &TradeIntent, _credentials: &ExchangeCredentials) -> Result<ExecutionOutcome> {
        self.answer(TradeAction::Cancel, intent)
    }

    fn edit_delay(&self) -> Duration {
        Duration::ZERO
    }
}

// ============================================================================
// Exchange payloads
// ============================================================================

pub mod binance_payloads {
    use serde_json::{json, Value};

    pub fn exchange_info() -> Value {
        json!({
            "timezone": "UTC",
            "symbols": [
                {
                    "symbol": "BTCUSDT",
                    "status": "TRADING",
                    "filters": [
                        {"filterType": "PRICE_FILTER", "minPrice": "556.80", "maxPrice": "4529764", "tickSize": "0.10"},
                        {"filterType": "LOT_SIZE", "minQty": "0.001", "maxQty": "1000", "stepSize": "0.001"},
                        {"filterType": "MARKET_LOT_SIZE", "minQty": "0.001", "maxQty": "120", "stepSize": "0.001"}
                    ]
                },
                {
                    "symbol": "1000PEPEUSDT",
                    "status": "TRADING",
                    "filters": [
                        {"filterType": "PRICE_FILTER", "tickSize": "0.0000001"},
                        {"filterType": "LOT_SIZE", "stepSize": "1"}
                    ]
                }
            ]
        })
    }

    pub fn leverage_brackets() -> Value {
        json!([{
            "symbol": "BTCUSDT",
            "brackets": [
                {"bracket": 1, "initialLeverage": 125, "notionalCap": 50000, "notionalFloor": 0, "maintMarginRatio": 0.004, "cum": 0.0},
                {"bracket": 2, "initialLeverage": 100, "notionalCap": 600000, "notionalFloor": 50000, "maintMarginRatio": 0.005, "cum": 50.0}
            ]
        }])
    }

    pub fn ticker(symbol: &str, price: &str) -> Value {
        json!({"symbol": symbol, "price": price, "time": 1700000000000u64})
    }

    pub fn order_ack(order_id: i64, order_type: &str) -> Value {
        json!({"orderId": order_id, "symbol": "BTCUSDT", "status": "NEW", "type": order_type})
    }

    pub fn position(amount: &str) -> Value {
        json!([{
            "symbol": "BTCUSDT",
            "positionAmt": amount,
            "entryPrice": "40000.0",
            "leverage": "10",
            "positionSide": "BOTH"
        }])
    }

    pub fn open_order(order_id: i64, order_type: &str) -> Value {
        json!({"orderId": order_id, "symbol": "BTCUSDT", "type": order_type, "side": "SELL", "closePosition": true})
    }
}

pub mod bybit_payloads {
    use serde_json::{json, Value};

    pub fn ok(result: Value) -> Value {
        json!({"retCode": 0, "retMsg": "OK", "result": result, "time": 1700000000000u64})
    }

    pub fn rejected(code: i64, message: &str) -> Value {
        json!({"retCode": code, "retMsg": message, "result": {}, "time": 1700000000000u64})
    }

    pub fn instruments_info() -> Value {
        instruments_info_with_max_leverage("100.00")
    }

    pub fn instruments_info_with_max_leverage(max_leverage: &str) -> Value {
        ok(json!({
            "category": "linear",
            "list": [{
                "symbol": "BTCUSDT",
                "status": "Trading",
                "priceFilter": {"minPrice": "0.10", "maxPrice": "199999.80", "tickSize": "0.10"},
                "lotSizeFilter": {"maxOrderQty": "100.000", "minOrderQty": "0.001", "qtyStep": "0.001"},
                "leverageFilter": {"minLeverage": "1", "maxLeverage": max_leverage, "leverageStep": "0.01"}
            }]
        }))
    }

    pub fn risk_limits() -> Value {
        ok(json!({
            "category": "linear",
            "list": [
                {"id": 1, "symbol": "BTCUSDT", "riskLimitValue": "2000000", "maintenanceMargin": "0.005", "initialMargin": "0.01", "maxLeverage": "100.00"},
                {"id": 2, "symbol": "BTCUSDT", "riskLimitValue": "4000000", "maintenanceMargin": "0.01", "initialMargin": "0.0175", "maxLeverage": "57.14"}
            ]
        }))
    }

    pub fn ticker(price: &str) -> Value {
        ok(json!({"category": "linear", "list": [{"symbol": "BTCUSDT", "lastPrice": price, "markPrice": price}]}))
    }

    pub fn order_ack() -> Value {
        ok(json!({"orderId": "1321003749386327552", "orderLinkId": ""}))
    }

    pub fn position(side: &str, size: &str) -> Value {
        ok(json!({
            "category": "linear",
            "list": [{"symbol": "BTCUSDT", "side": side, "size": size, "positionIdx": 0, "avgPrice": "40000"}]
        }))
    }

    pub fn wallet(balance: &str) -> Value {
        ok(json!({
            "list": [{"accountType": "UNIFIED", "coin": [{"coin": "USDT", "walletBalance": balance}]}]
        }))
    }
}
