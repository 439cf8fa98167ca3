//! Yen amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` values in whole yen; yen has no
//! minor unit, so the smallest currency unit is 1.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of the smallest currency unit.
pub const YEN_DECIMAL_PLACES: u32 = 0;

/// Rounds an amount to the smallest currency unit, half away from zero.
///
/// For non-negative magnitudes this is ordinary round-half-up, and it is
/// symmetric under negation: `round_to_unit(-x) == -round_to_unit(x)`.
#[must_use]
pub fn round_to_unit(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(YEN_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Returns true if the amount has no fractional currency unit.
#[must_use]
pub fn is_whole_unit(amount: Decimal) -> bool {
    amount.fract().is_zero()
}
