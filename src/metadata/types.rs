//! Instrument precision and leverage metadata

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::Result;
use crate::common::types::Exchange;

/// Tick size assumed when an exchange's filters cannot be fetched
pub const FALLBACK_TICK_SIZE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Step size assumed when an exchange's filters cannot be fetched
pub const FALLBACK_STEP_SIZE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
/// Leverage ceiling assumed when brackets cannot be fetched
pub const FALLBACK_MAX_LEVERAGE: u32 = 20;

/// Minimum increments an exchange accepts for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Price increment
    pub tick_size: Decimal,
    /// Quantity increment
    pub step_size: Decimal,
}

impl Precision {
    pub fn new(tick_size: Decimal, step_size: Decimal) -> Self {
        Self {
            tick_size,
            step_size,
        }
    }

    /// Conservative increments used when nothing better is known
    pub fn fallback() -> Self {
        Self::new(FALLBACK_TICK_SIZE, FALLBACK_STEP_SIZE)
    }
}

/// One bracket of a leverage schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageTier {
    /// Largest position notional this bracket allows
    pub max_notional: Decimal,
    /// Highest leverage allowed within this bracket
    pub max_leverage: u32,
}

impl LeverageTier {
    pub fn new(max_notional: Decimal, max_leverage: u32) -> Self {
        Self {
            max_notional,
            max_leverage,
        }
    }
}

/// An exchange's notional-bracket → max-leverage table for one symbol
///
/// Tiers are kept sorted from highest to lowest leverage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeverageSchedule {
    tiers: Vec<LeverageTier>,
}

impl LeverageSchedule {
    pub fn new(mut tiers: Vec<LeverageTier>) -> Self {
        tiers.sort_by(|a, b| {
            b.max_leverage
                .cmp(&a.max_leverage)
                .then(a.max_notional.cmp(&b.max_notional))
        });
        Self { tiers }
    }

    /// A single unbounded tier
    pub fn flat(max_leverage: u32) -> Self {
        Self::new(vec![LeverageTier::new(Decimal::MAX, max_leverage)])
    }

    pub fn tiers(&self) -> &[LeverageTier] {
        &self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The symbol's absolute leverage ceiling
    pub fn absolute_max(&self) -> Option<u32> {
        self.tiers.first().map(|t| t.max_leverage)
    }
}

/// Precision plus leverage schedule for one symbol on one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentMetadata {
    pub precision: Precision,
    pub leverage: LeverageSchedule,
}

/// Where the cache gets metadata from on a miss
///
/// One implementation per exchange. `fetch_precision` may return more
/// than the requested symbol when the exchange only offers a full catalog.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn exchange(&self) -> Exchange;

    async fn fetch_precision(&self, symbol: &str) -> Result<Vec<(String, Precision)>>;

    async fn fetch_leverage(&self, symbol: &str) -> Result<LeverageSchedule>;

    /// Conservative fallback used when fetching fails
    fn default_precision(&self) -> Precision;

    /// Conservative fallback used when fetching fails
    fn default_leverage(&self) -> LeverageSchedule;
}
