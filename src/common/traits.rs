//! Trait definitions at the router's seams

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::errors::Result;
use super::types::{Exchange, ExecutionOutcome, TradeIntent};
use crate::config::types::{BridgeConfig, ExchangeCredentials, GlobalSizingConfig};

/// Pause between the cancel and open halves of an EDIT
pub const DEFAULT_EDIT_DELAY: Duration = Duration::from_millis(500);

/// Trait for exchange adapters (Binance, Bybit, etc.)
///
/// Every operation is independent and fallible. Credentials are passed per
/// call because the operator may change them between intents.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// The exchange this adapter trades on
    fn exchange(&self) -> Exchange;

    /// Open a position: size, set leverage, place the entry and its TP/SL
    async fn open(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
        global: &GlobalSizingConfig,
    ) -> Result<ExecutionOutcome>;

    /// Selectively clear or replace TP and SL on the open position
    async fn modify(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome>;

    /// Flatten the position with a reduce-only market order and clear its orders
    async fn close(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome>;

    /// Cancel every open order on the symbol (best effort)
    async fn cancel(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome>;

    /// Wait between cancel and re-open during an EDIT
    fn edit_delay(&self) -> Duration {
        DEFAULT_EDIT_DELAY
    }

    /// Replace a pending order: cancel, wait for the book to settle, open again
    async fn edit(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
        global: &GlobalSizingConfig,
    ) -> Result<ExecutionOutcome> {
        self.cancel(intent, credentials).await?;
        let delay = self.edit_delay();
        debug!(exchange = %self.exchange(), ?delay, "Waiting before re-open");
        tokio::time::sleep(delay).await;
        self.open(intent, credentials, global).await
    }
}

/// Outbound notification boundary
///
/// Implementations must not block; the router never inspects the result.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Read accessor for the operator-managed configuration
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// A fresh snapshot, or `None` when nothing is configured yet
    async fn snapshot(&self) -> Option<BridgeConfig>;
}
