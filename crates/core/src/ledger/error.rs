//! Ledger error types.

use thiserror::Error;

/// Errors that can occur while folding or summing ledger amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Running balance left the representable range (corrupt data).
    #[error("Balance overflowed after {applied} applied movements")]
    BalanceOverflow {
        /// Number of movements applied before the overflow.
        applied: usize,
    },

    /// A sum of amounts left the representable range.
    #[error("Total overflowed after {summed} amounts")]
    TotalOverflow {
        /// Number of amounts summed before the overflow.
        summed: usize,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::TotalOverflow { .. } => "TOTAL_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_and_display() {
        let err = LedgerError::BalanceOverflow { applied: 3 };
        assert_eq!(err.error_code(), "BALANCE_OVERFLOW");
        assert_eq!(err.to_string(), "Balance overflowed after 3 applied movements");

        let err = LedgerError::TotalOverflow { summed: 2 };
        assert_eq!(err.error_code(), "TOTAL_OVERFLOW");
    }
}
