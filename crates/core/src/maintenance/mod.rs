//! Batch maintenance rules: run modes, duplicate grouping and idempotent
//! reconciliation adjustments.

pub mod adjustment;
pub mod duplicates;
pub mod report;

pub use adjustment::{ADJUSTMENT_REFERENCE_KIND, TargetBalance, adjustment_amount, adjustment_reference};
pub use duplicates::{
    DuplicateCandidate, DuplicateGroup, ExchangeKey, ServiceMovementKey, TransferKey, find_duplicate_groups,
};
pub use report::{BackfillReport, Correction, DuplicateEntity, DuplicateReport, RunMode};
