//! Per-currency closing details and discrepancies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::{CurrencyId, exceeds_tolerance, round_money};

/// One currency line of a cash count, as submitted by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingDetailInput {
    /// Currency counted.
    pub currency_id: CurrencyId,
    /// Opening balance for the day.
    pub opening_balance: Decimal,
    /// Balance the ledger says should be in the drawer.
    pub theoretical_closing: Decimal,
    /// Amount physically counted.
    pub physical_count: Decimal,
    /// Physical count held in notes.
    pub cash_notes: Decimal,
    /// Physical count held in coins.
    pub cash_coins: Decimal,
    /// Income for the day.
    pub income: Decimal,
    /// Expense for the day.
    pub expense: Decimal,
    /// Movements counted for the day.
    pub movement_count: i32,
    /// Operator explanation for a difference.
    pub justification: Option<String>,
}

impl ClosingDetailInput {
    /// Physical minus theoretical, rounded to cents.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        round_money(self.physical_count - self.theoretical_closing)
    }

    /// Returns true if the difference is above tolerance.
    #[must_use]
    pub fn has_discrepancy(&self) -> bool {
        exceeds_tolerance(self.difference())
    }
}

/// A difference reported on the day closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Currency.
    pub currency_id: CurrencyId,
    /// Expected amount.
    pub theoretical: Decimal,
    /// Counted amount.
    pub physical: Decimal,
    /// Physical minus theoretical.
    pub difference: Decimal,
    /// Operator explanation.
    pub justification: Option<String>,
}

/// Differences above tolerance, in input order.
#[must_use]
pub fn collect_discrepancies(details: &[ClosingDetailInput]) -> Vec<Discrepancy> {
    details
        .iter()
        .filter(|detail| detail.has_discrepancy())
        .map(|detail| Discrepancy {
            currency_id: detail.currency_id,
            theoretical: detail.theoretical_closing,
            physical: detail.physical_count,
            difference: detail.difference(),
            justification: detail.justification.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn detail(theoretical: Decimal, physical: Decimal) -> ClosingDetailInput {
        ClosingDetailInput {
            currency_id: CurrencyId::new(),
            opening_balance: Decimal::ZERO,
            theoretical_closing: theoretical,
            physical_count: physical,
            cash_notes: physical,
            cash_coins: Decimal::ZERO,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            movement_count: 0,
            justification: None,
        }
    }

    #[rstest]
    #[case(dec!(500), dec!(498.50), dec!(-1.50), true)]
    #[case(dec!(100), dec!(100.01), dec!(0.01), false)]
    #[case(dec!(100), dec!(99.98), dec!(-0.02), true)]
    #[case(dec!(100), dec!(100.004), dec!(0), false)]
    fn test_difference_and_tolerance(
        #[case] theoretical: Decimal,
        #[case] physical: Decimal,
        #[case] difference: Decimal,
        #[case] reported: bool,
    ) {
        let line = detail(theoretical, physical);
        assert_eq!(line.difference(), difference);
        assert_eq!(line.has_discrepancy(), reported);
    }

    #[test]
    fn test_collect_keeps_only_significant_differences() {
        let mut short = detail(dec!(500), dec!(498.50));
        short.justification = Some("Billete falso retenido".into());
        let details = vec![detail(dec!(10), dec!(10)), short.clone()];

        let discrepancies = collect_discrepancies(&details);

        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].currency_id, short.currency_id);
        assert_eq!(discrepancies[0].difference, dec!(-1.50));
        assert_eq!(discrepancies[0].justification.as_deref(), Some("Billete falso retenido"));
    }
}
