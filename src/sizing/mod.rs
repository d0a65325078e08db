//! Quantity sizing, step rounding and leverage resolution
//!
//! Everything here is pure; the adapters supply balances, prices and
//! metadata.

pub mod leverage;
pub mod quantity;

pub use leverage::resolve_leverage;
pub use quantity::{compute_quantity, margin_spent, round_to_step};
