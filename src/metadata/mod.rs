//! Instrument metadata: precision filters and leverage schedules

pub mod cache;
pub mod types;

pub use cache::MetadataCache;
pub use types::{
    InstrumentMetadata, LeverageSchedule, LeverageTier, MetadataSource, Precision,
    FALLBACK_MAX_LEVERAGE,
};
