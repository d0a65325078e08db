//! Unified types shared by the router and every exchange adapter

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported derivatives exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Binance => write!(f, "Binance"),
            Exchange::Bybit => write!(f, "Bybit"),
        }
    }
}

/// Position direction requested by the signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// The side that reduces a position opened with this side
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl TryFrom<String> for Side {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Order type for OPEN/EDIT intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

impl TryFrom<String> for OrderType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(format!("unknown order type: {}", other)),
        }
    }
}

/// The closed set of actions a trade intent can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Open,
    Close,
    Cancel,
    ModifyPosition,
    Edit,
}

impl TradeAction {
    /// Whether the action places a new entry order
    pub fn opens_position(self) -> bool {
        matches!(self, TradeAction::Open | TradeAction::Edit)
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Open => write!(f, "OPEN"),
            TradeAction::Close => write!(f, "CLOSE"),
            TradeAction::Cancel => write!(f, "CANCEL"),
            TradeAction::ModifyPosition => write!(f, "MODIFY_POSITION"),
            TradeAction::Edit => write!(f, "EDIT"),
        }
    }
}

/// A normalized trade instruction, independent of the signal source's wire format
///
/// `take_profit` / `stop_loss` distinguish absence from zero:
/// `None` leaves the existing trigger alone, `Some(0)` clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeIntent {
    /// Platform-native ticker (e.g. `BINANCE:BTCUSDT.P`)
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default, alias = "type")]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, alias = "tp")]
    pub take_profit: Option<Decimal>,
    #[serde(default, alias = "sl")]
    pub stop_loss: Option<Decimal>,
}

impl TradeIntent {
    /// Create an intent for a symbol with every optional field absent
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_limit_price(mut self, price: Decimal) -> Self {
        self.order_type = Some(OrderType::Limit);
        self.price = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// Order type, defaulting to MARKET when unset
    pub fn order_type(&self) -> OrderType {
        self.order_type.unwrap_or_default()
    }

    /// Check the fields the given action depends on
    pub fn validate(&self, action: TradeAction) -> crate::Result<()> {
        use crate::BridgeError;

        if self.symbol.trim().is_empty() {
            return Err(BridgeError::InvalidIntent("symbol is required".into()));
        }

        if action.opens_position() {
            if self.side.is_none() {
                return Err(BridgeError::InvalidIntent(format!(
                    "{} requires a side",
                    action
                )));
            }
            if self.order_type() == OrderType::Limit
                && !self.price.map(|p| p > Decimal::ZERO).unwrap_or(false)
            {
                return Err(BridgeError::InvalidIntent(
                    "LIMIT orders require a positive price".into(),
                ));
            }
        }

        for (name, value) in [("takeProfit", self.take_profit), ("stopLoss", self.stop_loss)] {
            if matches!(value, Some(v) if v < Decimal::ZERO) {
                return Err(BridgeError::InvalidIntent(format!("{} is negative", name)));
            }
        }

        Ok(())
    }

    /// Canonical serialization of the action-relevant fields
    ///
    /// Decimals are normalized so `50000` and `50000.0` produce the same signature.
    pub fn signature(&self, action: TradeAction) -> String {
        #[derive(Serialize)]
        struct Canonical<'a> {
            action: TradeAction,
            symbol: &'a str,
            side: Option<Side>,
            order_type: Option<OrderType>,
            price: Option<Decimal>,
            take_profit: Option<Decimal>,
            stop_loss: Option<Decimal>,
        }

        let canonical = Canonical {
            action,
            symbol: &self.symbol,
            side: self.side,
            order_type: self.order_type,
            price: self.price.map(|d| d.normalize()),
            take_profit: self.take_profit.map(|d| d.normalize()),
            stop_loss: self.stop_loss.map(|d| d.normalize()),
        };

        // Serializing plain fields into a String cannot fail
        serde_json::to_string(&canonical).unwrap_or_default()
    }
}

/// Inbound message from the signal source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMessage {
    pub action: TradeAction,
    #[serde(default)]
    pub data: TradeIntent,
}

impl IntentMessage {
    pub fn new(action: TradeAction, data: TradeIntent) -> Self {
        Self { action, data }
    }
}

/// What a single adapter operation did on its exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Opened {
        symbol: String,
        side: Side,
        quantity: Decimal,
        leverage: u32,
    },
    /// Entry accepted but a TP or SL order was rejected; the position is
    /// open without the protection the intent asked for
    OpenedUnprotected {
        symbol: String,
        side: Side,
        quantity: Decimal,
        leverage: u32,
        reason: String,
    },
    Modified {
        symbol: String,
    },
    Closed {
        symbol: String,
    },
    Canceled {
        symbol: String,
    },
    /// Nothing to act on; an expected no-op, not a failure
    NoPosition {
        symbol: String,
    },
}

impl ExecutionOutcome {
    /// Operator-facing notifications for this outcome, in send order
    pub fn notifications(&self, exchange: Exchange) -> Vec<Notification> {
        match self {
            ExecutionOutcome::Opened {
                symbol,
                side,
                quantity,
                leverage,
            } => vec![opened_notification(exchange, symbol, *side, *quantity, *leverage)],
            ExecutionOutcome::OpenedUnprotected {
                symbol,
                side,
                quantity,
                leverage,
                reason,
            } => vec![
                opened_notification(exchange, symbol, *side, *quantity, *leverage),
                Notification::new(
                    format!("{} Fail", exchange),
                    format!("Entry placed, TP/SL failed: {}", reason),
                ),
            ],
            ExecutionOutcome::Modified { .. } => vec![Notification::new(
                format!("{} Update", exchange),
                "TP/SL Modified",
            )],
            ExecutionOutcome::Closed { symbol } => {
                vec![Notification::new(format!("{} Closed", exchange), symbol.clone())]
            }
            ExecutionOutcome::Canceled { .. } | ExecutionOutcome::NoPosition { .. } => Vec::new(),
        }
    }
}

fn opened_notification(
    exchange: Exchange,
    symbol: &str,
    side: Side,
    quantity: Decimal,
    leverage: u32,
) -> Notification {
    Notification::new(
        format!("{}: {} {}", exchange, side, symbol),
        format!("Qty: {} | Lev: {}x", quantity, leverage),
    )
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_open_message() {
        let json = r#"{
            "action": "OPEN",
            "data": {"symbol": "BINANCE:BTCUSDT.P", "side": "buy", "type": "market", "tp": 50000}
        }"#;
        let msg: IntentMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg.action, TradeAction::Open);
        assert_eq!(msg.data.side, Some(Side::Long));
        assert_eq!(msg.data.order_type(), OrderType::Market);
        assert_eq!(msg.data.take_profit, Some(dec!(50000)));
        assert_eq!(msg.data.stop_loss, None);
    }

    #[test]
    fn test_zero_trigger_is_present() {
        let json = r#"{"action": "MODIFY_POSITION", "data": {"symbol": "ETHUSDT", "stopLoss": 0}}"#;
        let msg: IntentMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg.action, TradeAction::ModifyPosition);
        assert_eq!(msg.data.stop_loss, Some(Decimal::ZERO));
        assert_eq!(msg.data.take_profit, None);
    }

    #[test]
    fn test_order_type_defaults_to_market() {
        let intent = TradeIntent::new("BTCUSDT").with_side(Side::Short);
        assert_eq!(intent.order_type(), OrderType::Market);
        assert!(intent.validate(TradeAction::Open).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_side_for_open() {
        let intent = TradeIntent::new("BTCUSDT");
        assert!(intent.validate(TradeAction::Open).is_err());
        assert!(intent.validate(TradeAction::Edit).is_err());
        assert!(intent.validate(TradeAction::Close).is_ok());
    }

    #[test]
    fn test_validate_rejects_limit_without_price() {
        let mut intent = TradeIntent::new("BTCUSDT").with_side(Side::Long);
        intent.order_type = Some(OrderType::Limit);
        assert!(intent.validate(TradeAction::Open).is_err());

        let intent = intent.with_limit_price(dec!(39000));
        assert!(intent.validate(TradeAction::Open).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_symbol() {
        assert!(TradeIntent::new("  ").validate(TradeAction::Cancel).is_err());
    }

    #[test]
    fn test_signature_normalizes_decimals() {
        let a = TradeIntent::new("BTCUSDT").with_take_profit(dec!(50000));
        let b = TradeIntent::new("BTCUSDT").with_take_profit(dec!(50000.00));
        assert_eq!(
            a.signature(TradeAction::ModifyPosition),
            b.signature(TradeAction::ModifyPosition)
        );
        assert_ne!(
            a.signature(TradeAction::ModifyPosition),
            a.signature(TradeAction::Open)
        );
    }

    #[test]
    fn test_signature_distinguishes_zero_from_absent() {
        let absent = TradeIntent::new("BTCUSDT");
        let zero = TradeIntent::new("BTCUSDT").with_stop_loss(Decimal::ZERO);
        assert_ne!(
            absent.signature(TradeAction::ModifyPosition),
            zero.signature(TradeAction::ModifyPosition)
        );
    }

    #[test]
    fn test_outcome_notifications() {
        let closed = ExecutionOutcome::Closed {
            symbol: "BTCUSDT".into(),
        };
        assert_eq!(
            closed.notifications(Exchange::Bybit),
            vec![Notification::new("Bybit Closed", "BTCUSDT")]
        );

        let noop = ExecutionOutcome::NoPosition {
            symbol: "BTCUSDT".into(),
        };
        assert!(noop.notifications(Exchange::Binance).is_empty());
    }

    #[test]
    fn test_unprotected_open_reports_fill_then_failure() {
        let outcome = ExecutionOutcome::OpenedUnprotected {
            symbol: "BTCUSDT".into(),
            side: Side::Long,
            quantity: dec!(0.025),
            leverage: 10,
            reason: "Order would immediately trigger. (-2021)".into(),
        };

        assert_eq!(
            outcome.notifications(Exchange::Binance),
            vec![
                Notification::new("Binance: long BTCUSDT", "Qty: 0.025 | Lev: 10x"),
                Notification::new(
                    "Binance Fail",
                    "Entry placed, TP/SL failed: Order would immediately trigger. (-2021)"
                ),
            ]
        );
    }
}
