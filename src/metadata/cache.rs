//! Process-lifetime cache of instrument metadata

use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::{InstrumentMetadata, LeverageSchedule, MetadataSource, Precision};
use crate::common::types::Exchange;

type CacheKey = (Exchange, String);

/// Per-exchange, per-symbol metadata cache
///
/// Entries are populated on first access and never invalidated. Inserts are
/// first-writer-wins, so concurrent populates of the same symbol converge
/// on whichever landed first. Fallback defaults are never stored; a symbol
/// whose fetch failed is retried on its next use. A symbol missing from a
/// successful fetch is remembered as unlisted and served defaults without
/// another fetch.
#[derive(Debug, Default)]
pub struct MetadataCache {
    precision: RwLock<HashMap<CacheKey, Precision>>,
    leverage: RwLock<HashMap<CacheKey, LeverageSchedule>>,
    unlisted: RwLock<HashSet<CacheKey>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for a symbol, fetching through `source` on a miss
    ///
    /// Never fails: on fetch failure the source's defaults are returned.
    pub async fn get_metadata(&self, source: &dyn MetadataSource, symbol: &str) -> InstrumentMetadata {
        let (precision, leverage) = tokio::join!(
            self.precision_for(source, symbol),
            self.leverage_for(source, symbol)
        );

        InstrumentMetadata {
            precision,
            leverage,
        }
    }

    async fn precision_for(&self, source: &dyn MetadataSource, symbol: &str) -> Precision {
        let exchange = source.exchange();
        if let Some(precision) = self.cached_precision(exchange, symbol).await {
            return precision;
        }
        if self.is_unlisted(exchange, symbol).await {
            return source.default_precision();
        }

        match source.fetch_precision(symbol).await {
            Ok(entries) => {
                debug!(%exchange, entries = entries.len(), "Fetched precision metadata");
                self.insert_precision(exchange, entries).await;
                match self.cached_precision(exchange, symbol).await {
                    Some(precision) => precision,
                    None => {
                        warn!(%exchange, symbol, "Symbol missing from exchange metadata, using defaults");
                        self.unlisted
                            .write()
                            .await
                            .insert((exchange, symbol.to_string()));
                        source.default_precision()
                    }
                }
            }
            Err(e) => {
                warn!(%exchange, symbol, "Precision fetch failed, using defaults: {}", e);
                source.default_precision()
            }
        }
    }

    async fn leverage_for(&self, source: &dyn MetadataSource, symbol: &str) -> LeverageSchedule {
        let exchange = source.exchange();
        if let Some(schedule) = self.cached_leverage(exchange, symbol).await {
            return schedule;
        }

        match source.fetch_leverage(symbol).await {
            Ok(schedule) if !schedule.is_empty() => {
                self.insert_leverage(exchange, symbol, schedule).await
            }
            Ok(_) => {
                warn!(%exchange, symbol, "Empty leverage schedule, using defaults");
                source.default_leverage()
            }
            Err(e) => {
                warn!(%exchange, symbol, "Leverage fetch failed, using defaults: {}", e);
                source.default_leverage()
            }
        }
    }

    pub async fn cached_precision(&self, exchange: Exchange, symbol: &str) -> Option<Precision> {
        self.precision
            .read()
            .await
            .get(&(exchange, symbol.to_string()))
            .copied()
    }

    pub async fn cached_leverage(&self, exchange: Exchange, symbol: &str) -> Option<LeverageSchedule> {
        self.leverage
            .read()
            .await
            .get(&(exchange, symbol.to_string()))
            .cloned()
    }

    /// Whether a successful fetch already showed the symbol is not listed
    pub async fn is_unlisted(&self, exchange: Exchange, symbol: &str) -> bool {
        self.unlisted
            .read()
            .await
            .contains(&(exchange, symbol.to_string()))
    }

    /// Store precision entries; existing entries are kept
    pub async fn insert_precision(
        &self,
        exchange: Exchange,
        entries: impl IntoIterator<Item = (String, Precision)>,
    ) {
        let mut map = self.precision.write().await;
        for (symbol, precision) in entries {
            map.entry((exchange, symbol)).or_insert(precision);
        }
    }

    /// Store a schedule unless one is already cached; returns the cached one
    pub async fn insert_leverage(
        &self,
        exchange: Exchange,
        symbol: &str,
        schedule: LeverageSchedule,
    ) -> LeverageSchedule {
        self.leverage
            .write()
            .await
            .entry((exchange, symbol.to_string()))
            .or_insert(schedule)
            .clone()
    }

    /// Number of symbols with cached precision
    pub async fn len(&self) -> usize {
        self.precision.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.precision.read().await.is_empty()
    }
}
