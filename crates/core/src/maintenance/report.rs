//! Batch run modes and reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashdesk_shared::types::{CurrencyId, PointId};

/// Whether a batch job writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Report only.
    DryRun,
    /// Apply corrections.
    Execute,
}

impl RunMode {
    /// Execute only when the flag is set and the operator confirmed.
    #[must_use]
    pub const fn from_flags(execute: bool, confirmed: bool) -> Self {
        if execute && confirmed { Self::Execute } else { Self::DryRun }
    }

    /// Returns true if the job may write.
    #[must_use]
    pub const fn is_execute(self) -> bool {
        matches!(self, Self::Execute)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DryRun => f.write_str("dry-run"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// A snapshot whose stored amount differs from the recalculated one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Point.
    pub point_id: PointId,
    /// Currency.
    pub currency_id: CurrencyId,
    /// Snapshot amount before the run.
    pub stored: Decimal,
    /// Recalculated amount.
    pub calculated: Decimal,
    /// `stored - calculated`.
    pub diff: Decimal,
}

/// Result of a recalculation or correction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Mode the run used.
    pub mode: RunMode,
    /// Pairs examined.
    pub scanned: usize,
    /// Pairs over tolerance.
    pub corrections: Vec<Correction>,
    /// Corrections written (always zero on a dry run).
    pub applied: usize,
    /// Per-item failures, the run continues past them.
    pub errors: Vec<String>,
}

impl BackfillReport {
    /// Empty report for `mode`.
    #[must_use]
    pub const fn new(mode: RunMode) -> Self {
        Self {
            mode,
            scanned: 0,
            corrections: Vec::new(),
            applied: 0,
            errors: Vec::new(),
        }
    }
}

/// Domain records checked for duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEntity {
    /// Currency exchanges.
    Exchange,
    /// Transfers between points.
    Transfer,
    /// External-service guide movements.
    ServiceMovement,
}

impl std::fmt::Display for DuplicateEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exchange => f.write_str("exchanges"),
            Self::Transfer => f.write_str("transfers"),
            Self::ServiceMovement => f.write_str("external service movements"),
        }
    }
}

/// Duplicates found (and possibly removed) for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Entity kind.
    pub entity: DuplicateEntity,
    /// Groups of size > 1.
    pub groups: usize,
    /// Rows that are (or would be) removed.
    pub duplicates: usize,
    /// Rows actually removed, including ledger movements that referenced them.
    pub removed: u64,
}
