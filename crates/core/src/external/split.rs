//! Cash/bank split of a guide amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::round_money;

/// How a guide amount is distributed across buckets. Parts always sum to the
/// rounded amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSplit {
    /// Paid in notes.
    pub notes: Decimal,
    /// Paid in coins.
    pub coins: Decimal,
    /// Paid by bank deposit.
    pub bank: Decimal,
}

impl CashSplit {
    /// Physical cash portion (notes plus coins).
    #[must_use]
    pub fn cash(&self) -> Decimal {
        self.notes + self.coins
    }

    /// Sum of all parts.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.notes + self.coins + self.bank
    }
}

/// Normalizes a requested split against `amount`.
///
/// With no parts given the whole amount is notes. Negative parts count as
/// zero. Parts are clamped so their sum never exceeds `amount`, bank first,
/// then coins, then notes. Any shortfall is added to notes.
#[must_use]
pub fn normalize_split(
    amount: Decimal,
    notes: Option<Decimal>,
    coins: Option<Decimal>,
    bank: Option<Decimal>,
) -> CashSplit {
    let amount = round_money(amount.max(Decimal::ZERO));

    if notes.is_none() && coins.is_none() && bank.is_none() {
        return CashSplit {
            notes: amount,
            coins: Decimal::ZERO,
            bank: Decimal::ZERO,
        };
    }

    let part = |value: Option<Decimal>| round_money(value.unwrap_or_default().max(Decimal::ZERO));

    let bank = part(bank).min(amount);
    let coins = part(coins).min(amount - bank);
    let mut notes = part(notes).min(amount - bank - coins);

    let shortfall = amount - bank - coins - notes;
    if shortfall > Decimal::ZERO {
        notes += shortfall;
    }

    CashSplit { notes, coins, bank }
}

/// `current - by`, never below zero.
#[must_use]
pub fn floor_decrement(current: Decimal, by: Decimal) -> Decimal {
    (current - by).max(Decimal::ZERO)
}
