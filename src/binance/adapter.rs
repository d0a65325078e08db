//! Binance futures execution adapter

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::messages::{NewOrderRequest, OpenOrder, OrderSide, TriggerKind};
use super::rest::BinanceRestClient;
use crate::common::errors::{BridgeError, Result};
use crate::common::traits::{ExchangeAdapter, DEFAULT_EDIT_DELAY};
use crate::common::types::{Exchange, ExecutionOutcome, OrderType, TradeIntent};
use crate::config::types::{ExchangeCredentials, GlobalSizingConfig, SizingMode};
use crate::metadata::MetadataCache;
use crate::sizing::{compute_quantity, margin_spent, resolve_leverage, round_to_step};
use crate::symbol::normalize_for;
use crate::transport::HttpTransport;

/// Asset that margins every position
const MARGIN_ASSET: &str = "USDT";

/// Executes trade intents against Binance USDⓈ-M futures
///
/// TP and SL are separate conditional orders that close the whole position
/// at mark price, so they carry no quantity of their own.
#[derive(Debug, Clone)]
pub struct BinanceAdapter {
    transport: HttpTransport,
    cache: Arc<MetadataCache>,
    edit_delay: Duration,
}

impl BinanceAdapter {
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

    fn client<'a>(&'a self, credentials: &'a ExchangeCredentials) -> BinanceRestClient<'a> {
        BinanceRestClient::new(&self.transport, credentials)
    }
}

/// Where protective triggers for one position go
struct TriggerTarget<'a> {
    symbol: &'a str,
    /// Side that closes the position
    side: OrderSide,
    tick_size: Decimal,
}

impl TriggerTarget<'_> {
    /// Place a position-closing trigger when `price` is set and positive
    async fn place(
        &self,
        client: &BinanceRestClient<'_>,
        kind: TriggerKind,
        price: Option<Decimal>,
    ) -> Result<()> {
        let Some(price) = price.filter(|p| *p > Decimal::ZERO) else {
            return Ok(());
        };

        let order = NewOrderRequest::trigger(
            self.symbol,
            self.side,
            kind,
            round_to_step(price, self.tick_size),
        );
        client.place_order(&order).await?;
        debug!(symbol = self.symbol, ?kind, %price, "Trigger placed");
        Ok(())
    }

    /// Cancel existing triggers of `kind`, then place the replacement
    ///
    /// `None` leaves the trigger untouched, zero only clears it.
    async fn replace(
        &self,
        client: &BinanceRestClient<'_>,
        kind: TriggerKind,
        price: Option<Decimal>,
        existing: &[OpenOrder],
    ) -> Result<()> {
        if price.is_none() {
            return Ok(());
        }

        for order in existing.iter().filter(|o| kind.matches(&o.order_type)) {
            client.cancel_order(self.symbol, order.order_id).await?;
            debug!(symbol = self.symbol, order_id = order.order_id, ?kind, "Trigger canceled");
        }

        self.place(client, kind, price).await
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    #[instrument(skip_all, fields(exchange = "binance", symbol = %intent.symbol))]
    async fn open(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
        global: &GlobalSizingConfig,
    ) -> Result<ExecutionOutcome> {
        let side = intent
            .side
            .ok_or_else(|| BridgeError::InvalidIntent("side is required to open".into()))?;
        let symbol = normalize_for(Exchange::Binance, &intent.symbol);
        let client = self.client(credentials);

        let (metadata, price, balance) = tokio::join!(
            self.cache.get_metadata(&client, &symbol),
            client.ticker_price(&symbol),
            async {
                match global.sizing_mode {
                    SizingMode::Percent => client.available_balance(MARGIN_ASSET).await,
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

        let order_side = OrderSide::from(side);
        let entry = match intent.order_type() {
            OrderType::Market => NewOrderRequest::market(&symbol, order_side, quantity),
            OrderType::Limit => {
                let limit = intent.price.ok_or_else(|| {
                    BridgeError::InvalidIntent("LIMIT order requires a price".into())
                })?;
                NewOrderRequest::limit(
                    &symbol,
                    order_side,
                    quantity,
                    round_to_step(limit, metadata.precision.tick_size),
                )
            }
        };
        let response = client.place_order(&entry).await?;
        info!(symbol = %symbol, order_id = response.order_id, %quantity, leverage, "Entry placed");

        // The entry is live from here on; trigger failures must not hide it
        let target = TriggerTarget {
            symbol: &symbol,
            side: OrderSide::from(side.opposite()),
            tick_size: metadata.precision.tick_size,
        };
        let (tp, sl) = tokio::join!(
            target.place(&client, TriggerKind::TakeProfit, intent.take_profit),
            target.place(&client, TriggerKind::StopLoss, intent.stop_loss)
        );
        let failures: Vec<String> = [tp, sl]
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            return Ok(ExecutionOutcome::Opened {
                symbol,
                side,
                quantity,
                leverage,
            });
        }

        let reason = failures.join("; ");
        warn!(symbol = %symbol, "Entry placed without protection: {}", reason);
        Ok(ExecutionOutcome::OpenedUnprotected {
            symbol,
            side,
            quantity,
            leverage,
            reason,
        })
    }

    #[instrument(skip_all, fields(exchange = "binance", symbol = %intent.symbol))]
    async fn modify(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Binance, &intent.symbol);
        let client = self.client(credentials);

        let (metadata, position, orders) = tokio::join!(
            self.cache.get_metadata(&client, &symbol),
            client.position(&symbol),
            client.open_orders(&symbol)
        );
        let Some(position) = position? else {
            debug!(symbol = %symbol, "No open position to modify");
            return Ok(ExecutionOutcome::NoPosition { symbol });
        };
        let orders = orders?;

        let target = TriggerTarget {
            symbol: &symbol,
            side: position.closing_side(),
            tick_size: metadata.precision.tick_size,
        };
        let (tp, sl) = tokio::join!(
            target.replace(&client, TriggerKind::TakeProfit, intent.take_profit, &orders),
            target.replace(&client, TriggerKind::StopLoss, intent.stop_loss, &orders)
        );
        tp?;
        sl?;

        info!(symbol = %symbol, "TP/SL updated");
        Ok(ExecutionOutcome::Modified { symbol })
    }

    #[instrument(skip_all, fields(exchange = "binance", symbol = %intent.symbol))]
    async fn close(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Binance, &intent.symbol);
        let client = self.client(credentials);

        let Some(position) = client.position(&symbol).await? else {
            debug!(symbol = %symbol, "No open position to close");
            return Ok(ExecutionOutcome::NoPosition { symbol });
        };

        let order = NewOrderRequest::market(&symbol, position.closing_side(), position.position_amt.abs())
            .reduce_only();
        client.place_order(&order).await?;
        info!(symbol = %symbol, amount = %position.position_amt, "Position closed");

        if let Err(e) = client.cancel_all(&symbol).await {
            debug!(symbol = %symbol, "Cleanup after close failed: {}", e);
        }

        Ok(ExecutionOutcome::Closed { symbol })
    }

    #[instrument(skip_all, fields(exchange = "binance", symbol = %intent.symbol))]
    async fn cancel(
        &self,
        intent: &TradeIntent,
        credentials: &ExchangeCredentials,
    ) -> Result<ExecutionOutcome> {
        let symbol = normalize_for(Exchange::Binance, &intent.symbol);

        if let Err(e) = self.client(credentials).cancel_all(&symbol).await {
            debug!(symbol = %symbol, "Cancel-all ignored: {}", e);
        }

        Ok(ExecutionOutcome::Canceled { symbol })
    }

    fn edit_delay(&self) -> Duration {
        self.edit_delay
    }
}
