//! Ledger rules.
//!
//! This module implements the cash-ledger functionality:
//! - Movement kinds, including an `Unknown` fallback for legacy values
//! - Sign normalization of stored movement amounts
//! - Bank-bucket detection
//! - Folding movements into a cash balance

pub mod balance;
pub mod error;
pub mod kind;
pub mod normalizer;

pub use balance::{CashFold, MovementLine, fold_cash_balance};
pub use error::LedgerError;
pub use kind::{Direction, MovementKind};
pub use normalizer::{cash_description, is_bank_movement, normalize};
