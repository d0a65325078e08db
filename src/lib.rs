//! Trade Mirror Library
//!
//! Mirrors trade actions captured from a charting platform onto Binance
//! USDⓈ-M and Bybit linear futures accounts: symbol normalization, position
//! sizing, leverage tier resolution, signed order placement and
//! per-exchange failure reporting.

pub mod binance;
pub mod bybit;
pub mod common;
pub mod config;
pub mod metadata;
pub mod notify;
pub mod router;
pub mod sizing;
pub mod symbol;
pub mod transport;

// Re-export commonly used types
pub use common::errors::{BridgeError, Result};
pub use common::traits::{ConfigSource, ExchangeAdapter, Notifier};
pub use common::types::{
    Exchange, ExecutionOutcome, IntentMessage, Notification, OrderType, Side, TradeAction,
    TradeIntent,
};
pub use config::types::{BridgeConfig, ExchangeCredentials, GlobalSizingConfig, SizingMode};

// Exchanges
pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;

// Routing
pub use metadata::MetadataCache;
pub use notify::{ChannelNotifier, LogNotifier};
pub use router::{DropReason, ExchangeReport, IntentRouter, RouteOutcome};
pub use transport::HttpTransport;
