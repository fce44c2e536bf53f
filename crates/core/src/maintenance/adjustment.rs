//! Idempotent reconciliation adjustments.
//!
//! A manual target balance is applied by writing a single `AJUSTE` movement
//! keyed by reference kind and a reference id built from point, currency and
//! tag. Re-running the same target rewrites that movement instead of adding
//! another one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::{CurrencyId, PointId, round_money};

/// Reference kind stored on adjustment movements.
pub const ADJUSTMENT_REFERENCE_KIND: &str = "RECONCILIATION_ADJUSTMENT";

/// Target balance for a (point, currency), usually read from a JSON file
/// built from a physical count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBalance {
    /// Point.
    pub point_id: PointId,
    /// Currency.
    pub currency_id: CurrencyId,
    /// Balance the pair must end up with.
    pub target: Decimal,
    /// Identifies the correction batch, e.g. `2026-03-10-arqueo`.
    pub tag: String,
    /// Free-text note copied into the movement description.
    #[serde(default)]
    pub note: Option<String>,
}

/// Reference id of the adjustment movement for a target.
#[must_use]
pub fn adjustment_reference(point_id: PointId, currency_id: CurrencyId, tag: &str) -> String {
    format!("{point_id}:{currency_id}:{tag}")
}

/// Amount the adjustment movement must carry so the calculated balance lands
/// on `target`.
///
/// `calculated` already includes `existing`, the amount of a previous
/// adjustment with the same reference, so it is backed out first.
#[must_use]
pub fn adjustment_amount(calculated: Decimal, existing: Option<Decimal>, target: Decimal) -> Decimal {
    let without_adjustment = calculated - existing.unwrap_or_default();
    round_money(target - without_adjustment)
}
