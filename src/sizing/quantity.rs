//! Order quantity computation and step rounding

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::types::SizingMode;

/// Decimal places kept when an exchange reports no usable step
const FALLBACK_DECIMALS: u32 = 4;

/// Margin committed to a new position
///
/// Fixed mode spends `sizing_value` directly; percent mode spends that
/// percentage of `balance`.
pub fn margin_spent(mode: SizingMode, sizing_value: Decimal, balance: Decimal) -> Decimal {
    match mode {
        SizingMode::Fixed => sizing_value,
        SizingMode::Percent => balance * sizing_value / Decimal::ONE_HUNDRED,
    }
}

/// Raw (unrounded) quantity: `margin * leverage / price`
///
/// A non-positive price yields zero so the caller's "quantity too small"
/// check rejects the order.
pub fn compute_quantity(
    mode: SizingMode,
    sizing_value: Decimal,
    balance: Decimal,
    leverage: u32,
    price: Decimal,
) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    margin_spent(mode, sizing_value, balance) * Decimal::from(leverage) / price
}

/// Floor `value` to a multiple of `step`, with exactly as many decimal
/// places as `step` has
///
/// Always rounds toward less exposure, never up. A non-positive step
/// truncates to four decimals.
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value.round_dp_with_strategy(FALLBACK_DECIMALS, RoundingStrategy::ToZero);
    }

    let step = step.normalize();
    let mut rounded = (value / step).floor() * step;
    rounded.rescale(step.scale());
    rounded
}
