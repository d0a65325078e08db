//! Fan-out of trade intents to every active exchange

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::dedup::Deduplicator;
use crate::common::errors::Result;
use crate::common::traits::{ConfigSource, ExchangeAdapter, Notifier};
use crate::common::types::{Exchange, ExecutionOutcome, IntentMessage, TradeAction, TradeIntent};
use crate::config::types::{ExchangeCredentials, GlobalSizingConfig};

/// Why an intent was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    InvalidIntent,
    NoConfiguration,
    NoActiveExchange,
}

/// Result of one exchange's share of an intent
#[derive(Debug)]
pub struct ExchangeReport {
    pub exchange: Exchange,
    pub result: Result<ExecutionOutcome>,
}

/// What the router did with an intent
#[derive(Debug)]
pub enum RouteOutcome {
    /// Identical to the previous intent within the dedup window
    Duplicate,
    Dropped(DropReason),
    /// One report per exchange the intent was sent to
    Dispatched(Vec<ExchangeReport>),
}

impl RouteOutcome {
    pub fn reports(&self) -> &[ExchangeReport] {
        match self {
            RouteOutcome::Dispatched(reports) => reports,
            _ => &[],
        }
    }
}

/// Routes each intent to every configured exchange concurrently
///
/// Exchange failures are isolated: each branch is reported and notified on
/// its own and never affects the others.
pub struct IntentRouter {
    config: Arc<dyn ConfigSource>,
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    notifier: Arc<dyn Notifier>,
    dedup: Deduplicator,
}

impl IntentRouter {
    pub fn new(config: Arc<dyn ConfigSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            adapters: Vec::new(),
            notifier,
            dedup: Deduplicator::default(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup = Deduplicator::new(window);
        self
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.adapters.iter().map(|a| a.exchange()).collect()
    }

    pub async fn route(&self, message: &IntentMessage) -> RouteOutcome {
        self.route_at(message, Instant::now()).await
    }

    /// Route an intent received at `at`
    #[instrument(skip_all, fields(action = %message.action, symbol = %message.data.symbol))]
    pub async fn route_at(&self, message: &IntentMessage, at: Instant) -> RouteOutcome {
        let action = message.action;
        let intent = &message.data;

        if let Err(e) = intent.validate(action) {
            warn!("Dropping intent: {}", e);
            return RouteOutcome::Dropped(DropReason::InvalidIntent);
        }

        if !self.dedup.admit(&intent.signature(action), at) {
            debug!("Duplicate intent suppressed");
            return RouteOutcome::Duplicate;
        }

        let Some(config) = self.config.snapshot().await else {
            debug!("No configuration, ignoring intent");
            return RouteOutcome::Dropped(DropReason::NoConfiguration);
        };

        let selected: Vec<(&Arc<dyn ExchangeAdapter>, &ExchangeCredentials)> = self
            .adapters
            .iter()
            .filter_map(|adapter| {
                config
                    .usable_credentials(adapter.exchange())
                    .map(|credentials| (adapter, credentials))
            })
            .collect();

        if selected.is_empty() {
            info!("No active exchange, ignoring intent");
            return RouteOutcome::Dropped(DropReason::NoActiveExchange);
        }

        let global = &config.global;
        let branches = selected.into_iter().map(|(adapter, credentials)| async move {
            let exchange = adapter.exchange();
            let result = dispatch(adapter.as_ref(), action, intent, credentials, global).await;
            ExchangeReport { exchange, result }
        });
        let reports = join_all(branches).await;

        for report in &reports {
            self.notify(report);
        }

        RouteOutcome::Dispatched(reports)
    }

    fn notify(&self, report: &ExchangeReport) {
        let exchange = report.exchange;
        match &report.result {
            Ok(outcome) => {
                debug!(%exchange, ?outcome, "Exchange branch finished");
                for notification in outcome.notifications(exchange) {
                    self.notifier.notify(&notification.title, &notification.message);
                }
            }
            Err(e) if e.is_sizing_failure() => {
                warn!(%exchange, "{}", e);
                self.notifier.notify(&format!("{} Error", exchange), "Qty too small");
            }
            Err(e) => {
                error!(%exchange, "Execution failed: {}", e);
                self.notifier.notify(&format!("{} Fail", exchange), &e.to_string());
            }
        }
    }

    /// Consume intents until the channel closes, one task per intent
    ///
    /// Returns once the channel is closed and every in-flight intent has
    /// finished.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<IntentMessage>) {
        info!(exchanges = ?self.exchanges(), "Intent router started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                message = receiver.recv() => {
                    let Some(message) = message else { break };
                    let received_at = Instant::now();
                    let router = Arc::clone(&self);
                    in_flight.spawn(async move {
                        router.route_at(&message, received_at).await;
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("Intent task failed: {}", e);
                    }
                }
            }
        }

        info!(pending = in_flight.len(), "Intent channel closed, draining");
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Intent task failed: {}", e);
            }
        }
        info!("Router stopped");
    }
}

async fn dispatch(
    adapter: &dyn ExchangeAdapter,
    action: TradeAction,
    intent: &TradeIntent,
    credentials: &ExchangeCredentials,
    global: &GlobalSizingConfig,
) -> Result<ExecutionOutcome> {
    match action {
        TradeAction::Open => adapter.open(intent, credentials, global).await,
        TradeAction::Edit => adapter.edit(intent, credentials, global).await,
        TradeAction::ModifyPosition => adapter.modify(intent, credentials).await,
        TradeAction::Close => adapter.close(intent, credentials).await,
        TradeAction::Cancel => adapter.cancel(intent, credentials).await,
    }
}
