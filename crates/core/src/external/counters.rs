//! Assigned and used counters of an external-service balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from credit/debit rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// Amount was zero or negative.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Debit would make used exceed assigned.
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Available before the debit.
        available: Decimal,
        /// Requested debit.
        requested: Decimal,
    },
}

impl CounterError {
    /// Stable code callers branch on.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
        }
    }
}

/// Total assigned and total used on a service balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCounters {
    /// Credit assigned to the point.
    pub total_assigned: Decimal,
    /// Credit consumed by issued guides.
    pub total_used: Decimal,
}

impl ServiceCounters {
    /// Remaining credit.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.total_assigned - self.total_used
    }

    /// Adds `amount` to the assigned total.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidAmount`] when `amount <= 0`.
    pub fn credit(self, amount: Decimal) -> Result<Self, CounterError> {
        ensure_positive(amount)?;
        Ok(Self {
            total_assigned: self.total_assigned + amount,
            ..self
        })
    }

    /// Adds `amount` to the used total.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidAmount`] when `amount <= 0`,
    /// [`CounterError::InsufficientBalance`] when used would exceed assigned.
    pub fn debit(self, amount: Decimal) -> Result<Self, CounterError> {
        ensure_positive(amount)?;
        let total_used = self.total_used + amount;
        if total_used > self.total_assigned {
            return Err(CounterError::InsufficientBalance {
                available: self.available(),
                requested: amount,
            });
        }
        Ok(Self { total_used, ..self })
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), CounterError> {
    if amount <= Decimal::ZERO {
        return Err(CounterError::InvalidAmount(amount));
    }
    Ok(())
}
