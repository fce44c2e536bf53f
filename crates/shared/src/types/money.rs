//! Money rounding and comparison helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` everywhere.

use rust_decimal::{Decimal, RoundingStrategy};

/// Differences at or below one cent are treated as equal.
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true when `|difference|` is strictly greater than [`MONEY_TOLERANCE`].
#[must_use]
pub fn exceeds_tolerance(difference: Decimal) -> bool {
    difference.abs() > MONEY_TOLERANCE
}
