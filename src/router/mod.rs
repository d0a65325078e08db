//! Intent validation, deduplication and per-exchange dispatch

pub mod dedup;
pub mod intent_router;

pub use dedup::{Deduplicator, DEFAULT_DEDUP_WINDOW};
pub use intent_router::{DropReason, ExchangeReport, IntentRouter, RouteOutcome};
