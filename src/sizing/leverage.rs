//! Leverage tier resolution

use rust_decimal::Decimal;

use crate::metadata::types::LeverageSchedule;

/// Pick the leverage to request from the exchange
///
/// Single pass: notional is estimated at the first-pass leverage
/// (operator cap clamped to the symbol maximum), the first tier from the
/// top whose notional ceiling holds that estimate is chosen, and its
/// leverage is capped again by the operator's cap. If no tier holds the
/// estimate, the lowest tier is used even though the position will exceed
/// its ceiling; the exchange rejects such an order.
///
/// The result never exceeds `cap`, the symbol's absolute maximum or the
/// chosen tier's leverage, and is at least 1.
pub fn resolve_leverage(cap: u32, schedule: &LeverageSchedule, margin: Decimal) -> u32 {
    let cap = cap.max(1);
    let absolute = schedule.absolute_max().unwrap_or(cap);
    let first_pass = cap.min(absolute).max(1);
    let estimated_notional = margin * Decimal::from(first_pass);

    let tier_cap = schedule
        .tiers()
        .iter()
        .find(|tier| tier.max_notional >= estimated_notional)
        .or_else(|| schedule.tiers().last())
        .map(|tier| tier.max_leverage)
        .unwrap_or(first_pass);

    tier_cap.min(first_pass).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::types::LeverageTier;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn btc_brackets() -> LeverageSchedule {
        LeverageSchedule::new(vec![
            LeverageTier::new(dec!(50000), 125),
            LeverageTier::new(dec!(600000), 100),
            LeverageTier::new(dec!(3000000), 75),
            LeverageTier::new(dec!(12000000), 50),
        ])
    }

    #[test]
    fn test_small_position_gets_full_cap() {
        assert_eq!(resolve_leverage(10, &btc_brackets(), dec!(100)), 10);
    }

    #[test]
    fn test_large_notional_drops_tier() {
        // 1000 margin at 125x = 125k notional, beyond the 50k bracket
        assert_eq!(resolve_leverage(125, &btc_brackets(), dec!(1000)), 100);
    }

    #[test]
    fn test_symbol_max_clamps_cap() {
        let schedule = LeverageSchedule::flat(20);
        assert_eq!(resolve_leverage(50, &schedule, dec!(10)), 20);
    }

    #[test]
    fn test_oversized_falls_to_lowest_tier() {
        assert_eq!(resolve_leverage(125, &btc_brackets(), dec!(1000000)), 50);
    }

    #[test]
    fn test_empty_schedule_uses_cap() {
        assert_eq!(resolve_leverage(7, &LeverageSchedule::default(), dec!(100)), 7);
    }

    #[test]
    fn test_zero_cap_treated_as_one() {
        assert_eq!(resolve_leverage(0, &btc_brackets(), dec!(100)), 1);
    }

    fn schedule_strategy() -> impl Strategy<Value = LeverageSchedule> {
        prop::collection::vec((1i64..10_000_000, 1u32..=125), 0..6).prop_map(|tiers| {
            LeverageSchedule::new(
                tiers
                    .into_iter()
                    .map(|(notional, lev)| LeverageTier::new(Decimal::from(notional), lev))
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_operator_cap(
            cap in 1u32..=200,
            schedule in schedule_strategy(),
            margin in 0i64..10_000_000,
        ) {
            let leverage = resolve_leverage(cap, &schedule, Decimal::from(margin));
            prop_assert!(leverage <= cap);
            prop_assert!(leverage >= 1);
            if let Some(max) = schedule.absolute_max() {
                prop_assert!(leverage <= max.max(1));
            }
        }
    }
}
