//! Bybit linear perpetual execution adapter

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::messages::{BybitSide, CreateOrderRequest, TradingStopRequest, CLEAR_TRIGGER};
use super::rest::BybitRestClient;
use crate::common::errors::{BridgeError, Result};
use crate::common::traits::{ExchangeAdapter, DEFAULT_EDIT_DELAY};
use crate::common::types::{Exchange, ExecutionOutcome, OrderType, TradeIntent};
use crate::config::types::{ExchangeCredentials, GlobalSizingConfig, SizingMode};
use crate::metadata::MetadataCache;
use crate::sizing::{compute_quantity, margin_spent, resolve_leverage, round_to_step};
use crate::symbol::normalize_for;
use crate::transport::HttpTransport;

const MARGIN_COIN: &str = "USDT";

/// Executes trade intents against Bybit's unified trading account
///
/// TP and SL ride on the entry order and are changed afterwards through
/// the position's trading-stop settings.
#[derive(Debug, Clone)]
pub struct BybitAdapter {
    transport: HttpTransport,
    cache: Arc<MetadataCache>,
    edit_delay: Duration,
}

impl BybitAdapter {
    pub fn new(transport: HttpTransport, cache: Arc<MetadataCache>) -> Self {
        Self {
            transport,
            cache,
            edit_delay: DEFAULT_EDIT_DELAY,
        }
    }

    pub fn with_edit_delay(mut self, edit_delay: Duration) -> Self {
        self.edit_delay = edit_delay;
        self
    }

    fn client<'a>(&'a self, credentials: &'a ExchangeCredentials) -> BybitRestClient<'a> {
        BybitRestClient::new(&self.transport, credentials)
    }
}

/// Trading-stop value for a requested trigger: rounded price, or the
/// clear marker for zero
fn trading_stop_value(price: Option<Decimal>, tick_size: Decimal) -> Option<String> {
    price.map(|p| {
        if p > Decimal::ZERO {
            round_to_step(p, tick_size).to_string()
        } else {
            CLEAR_TRIGGER.to_string()
        }
    })
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    #[instrument(skip_all, fields(exchange = "bybit", symbol = %intent.symbol))]
    async fn open(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
        global: &GlobalSizingConfig,
    ) -> Result<ExecutionOutcome> {
        let side = intent
            .side
            .ok_or_else(|| BridgeError::InvalidIntent("side is required to open".into()))?;
        let symbol = normalize_for(Exchange::Bybit, &intent.symbol);
        let client = self.client(credentials);

        let (metadata, price, balance) = tokio::join!(
            self.cache.get_metadata(&client, &symbol),
            client.ticker_price(&symbol),
            async {
                match global.sizing_mode {
                    SizingMode::Percent => client.wallet_balance(MARGIN_COIN).await,
                    SizingMode::Fixed => Ok(Decimal::ZERO),
                }
            }
        );
        let price = price?;
        let balance = balance?;

        let margin = margin_spent(global.sizing_mode, global.sizing_value, balance);
        let leverage = resolve_leverage(global.leverage_cap(), &metadata.leverage, margin);
        let raw_quantity = compute_quantity(global.sizing_mode, global.sizing_value, balance, leverage, price);
        let quantity = round_to_step(raw_quantity, metadata.precision.step_size);
        debug!(%price, %margin, leverage, %raw_quantity, %quantity, "Sized order");

        if quantity <= Decimal::ZERO {
            return Err(BridgeError::QuantityTooSmall { symbol });
        }

        if let Err(e) = client.set_leverage(&symbol, leverage).await {
            warn!(symbol = %symbol, leverage, "Failed to set leverage, continuing: {}", e);
        }

        let tick = metadata.precision.tick_size;
        let order_side = BybitSide::from(side);
        let mut order = match intent.order_type() {
            OrderType::Market => CreateOrderRequest::market(&symbol, order_side, quantity),
            OrderType::Limit => {
                let limit = intent.price.ok_or_else(|| {
                    BridgeError::InvalidIntent("LIMIT order requires a price".into())
                })?;
                CreateOrderRequest::limit(&symbol, order_side, quantity, round_to_step(limit, tick))
            }
        };
        if let Some(tp) = intent.take_profit.filter(|p| *p > Decimal::ZERO) {
            order = order.with_take_profit(round_to_step(tp, tick));
        }
        if let Some(sl) = intent.stop_loss.filter(|p| *p > Decimal::ZERO) {
            order = order.with_stop_loss(round_to_step(sl, tick));
        }

        let order_id = client.create_order(&order).await?;
        info!(symbol = %symbol, order_id = %order_id, %quantity, leverage, "Entry placed");

        Ok(ExecutionOutcome::Opened {
            symbol,
            side,
            quantity,
            leverage,
        })
    }

    #[instrument(skip_all, fields(exchange = "bybit", symbol = %intent.symbol))]
    async fn modify(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Bybit, &intent.symbol);
        let client = self.client(credentials);

        let (metadata, position) = tokio::join!(
            self.cache.get_metadata(&client, &symbol),
            client.position(&symbol)
        );
        let Some(position) = position? else {
            debug!(symbol = %symbol, "No open position to modify");
            return Ok(ExecutionOutcome::NoPosition { symbol });
        };

        let tick = metadata.precision.tick_size;
        let mut request = TradingStopRequest::new(&symbol, position.position_idx);
        request.take_profit = trading_stop_value(intent.take_profit, tick);
        request.stop_loss = trading_stop_value(intent.stop_loss, tick);

        if request.is_empty() {
            debug!(symbol = %symbol, "Nothing to modify");
        } else {
            client.set_trading_stop(&request).await?;
            info!(symbol = %symbol, "TP/SL updated");
        }

        Ok(ExecutionOutcome::Modified { symbol })
    }

    #[instrument(skip_all, fields(exchange = "bybit", symbol = %intent.symbol))]
    async fn close(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Bybit, &intent.symbol);
        let client = self.client(credentials);

        let Some(position) = client.position(&symbol).await? else {
            debug!(symbol = %symbol, "No open position to close");
            return Ok(ExecutionOutcome::NoPosition { symbol });
        };

        let order = CreateOrderRequest::market(&symbol, position.closing_side(), position.size).reduce_only();
        client.create_order(&order).await?;
        info!(symbol = %symbol, size = %position.size, "Position closed");

        if let Err(e) = client.cancel_all(&symbol).await {
            debug!(symbol = %symbol, "Cleanup after close failed: {}", e);
        }

        Ok(ExecutionOutcome::Closed { symbol })
    }

    #[instrument(skip_all, fields(exchange = "bybit", symbol = %intent.symbol))]
    async fn cancel(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Bybit, &intent.symbol);

        if let Err(e) = self.client(credentials).cancel_all(&symbol).await {
            debug!(symbol = %symbol, "Cancel-all ignored: {}", e);
        }

        Ok(ExecutionOutcome::Canceled { symbol })
    }

    fn edit_delay(&self) -> Duration {
        self.edit_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trading_stop_value() {
        assert_eq!(trading_stop_value(None, dec!(0.1)), None);
        assert_eq!(trading_stop_value(Some(Decimal::ZERO), dec!(0.1)), Some("0".to_string()));
        assert_eq!(
            trading_stop_value(Some(dec!(41234.56)), dec!(0.1)),
            Some("41234.5".to_string())
        );
    }
}
