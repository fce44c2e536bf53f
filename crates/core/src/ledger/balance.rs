//! Cash balance folding.
//!
//! The authoritative cash balance of a (point, currency) pair is the active
//! initial balance plus every normalized movement recorded at or after the
//! initial balance's assignment instant. Callers fetch the rows; this module
//! only folds them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::round_money;

use super::error::LedgerError;
use super::kind::MovementKind;
use super::normalizer::{is_bank_movement, normalize};

/// Borrowed view of one ledger row, as needed by the fold.
#[derive(Debug, Clone)]
pub struct MovementLine<'a> {
    /// Movement kind.
    pub kind: MovementKind,
    /// Stored (possibly mis-signed) amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: Option<&'a str>,
}

impl<'a> MovementLine<'a> {
    /// Builds a line from stored column values.
    #[must_use]
    pub fn new(kind: &str, amount: Decimal, description: Option<&'a str>) -> Self {
        Self {
            kind: MovementKind::parse(kind),
            amount,
            description,
        }
    }
}

/// Result of folding a movement stream onto a base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFold {
    /// Final balance, rounded to cents.
    pub balance: Decimal,
    /// Movements that contributed.
    pub applied: usize,
    /// Movements skipped because they belong to the bank bucket.
    pub skipped_bank: usize,
    /// `SALDO_INICIAL` movements skipped because the base already holds them.
    pub skipped_initial: usize,
}

/// Folds movements (already filtered to the cutover window, oldest first)
/// onto `base`.
///
/// # Errors
///
/// Returns [`LedgerError::BalanceOverflow`] if the running total leaves the
/// representable range, which only happens with corrupt rows.
pub fn fold_cash_balance<'a, I>(base: Decimal, movements: I) -> Result<CashFold, LedgerError>
where
    I: IntoIterator<Item = MovementLine<'a>>,
{
    let mut fold = CashFold {
        balance: base,
        applied: 0,
        skipped_bank: 0,
        skipped_initial: 0,
    };

    for line in movements {
        if is_bank_movement(line.description) {
            fold.skipped_bank += 1;
            continue;
        }
        if line.kind == MovementKind::InitialBalance {
            fold.skipped_initial += 1;
            continue;
        }

        let delta = normalize(&line.kind, line.amount, line.description);
        fold.balance = fold
            .balance
            .checked_add(delta)
            .ok_or(LedgerError::BalanceOverflow {
                applied: fold.applied,
            })?;
        fold.applied += 1;
    }

    fold.balance = round_money(fold.balance);
    Ok(fold)
}
