//! Day summary shown before closing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::{CashCountId, CurrencyId};

use crate::ledger::LedgerError;

/// Income and expense of a currency for the day, split by stored sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTotals {
    /// Sum of positive stored amounts.
    pub income: Decimal,
    /// Sum of magnitudes of negative stored amounts.
    pub expense: Decimal,
    /// Movements seen.
    pub count: i32,
}

impl MovementTotals {
    /// Adds one stored amount.
    ///
    /// # Errors
    ///
    /// [`LedgerError::TotalOverflow`] if either total leaves the
    /// representable range. The totals are left unchanged.
    pub fn record(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        let summed = usize::try_from(self.count).unwrap_or_default();
        let overflow = || LedgerError::TotalOverflow { summed };
        if amount.is_sign_negative() {
            self.expense = self.expense.checked_add(amount.abs()).ok_or_else(overflow)?;
        } else {
            self.income = self.income.checked_add(amount).ok_or_else(overflow)?;
        }
        self.count += 1;
        Ok(())
    }

    /// Totals of a day's stored amounts.
    ///
    /// # Errors
    ///
    /// [`LedgerError::TotalOverflow`] on corrupt amounts.
    pub fn from_amounts<I>(amounts: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut totals = Self::default();
        for amount in amounts {
            totals.record(amount)?;
        }
        Ok(totals)
    }
}

/// Sums amounts with overflow checking.
///
/// # Errors
///
/// [`LedgerError::TotalOverflow`] if the sum leaves the representable range.
pub fn checked_total<I>(amounts: I) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .enumerate()
        .try_fold(Decimal::ZERO, |total, (summed, amount)| {
            total
                .checked_add(amount)
                .ok_or(LedgerError::TotalOverflow { summed })
        })
}

/// Per-currency line of the day summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDaySummary {
    /// Currency.
    pub currency_id: CurrencyId,
    /// ISO-like code.
    pub currency_code: String,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Balance the ledger says should be in the drawer now.
    pub theoretical_closing: Decimal,
    /// Day movements split by sign.
    pub totals: MovementTotals,
}

/// Operation counts for the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayActivity {
    /// Completed exchanges.
    pub exchanges: u64,
    /// Approved transfers into the point.
    pub transfers_in: u64,
    /// Approved transfers out of the point.
    pub transfers_out: u64,
    /// External-service guide movements.
    pub external_operations: u64,
}

/// Everything the operator sees before closing a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Business day.
    pub day: NaiveDate,
    /// One line per touched currency, ordered by code.
    pub currencies: Vec<CurrencyDaySummary>,
    /// Operation counts.
    pub activity: DayActivity,
    /// The user's open or partial cash count for the day.
    pub open_cash_count: Option<CashCountId>,
}
