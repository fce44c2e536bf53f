//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod balance;
pub mod closing;
pub mod external_service;
pub(crate) mod ledger;
pub mod maintenance;
pub mod reference;

pub use balance::{
    AssignInitialBalanceInput, BalanceError, BalanceRepository, CurrencyReconciliation,
    ReconcileOutcome, calculate_balance,
};
pub use closing::{
    CashCountInput, ClosingError, ClosingReceipt, ClosingRepository, ClosingResult,
    ClosureStatus, ClosureValidation, PartialCountResult,
};
pub use external_service::{
    CounterOutcome, ExternalServiceError, ExternalServiceLedger, GuideLedgerOutcome,
    GuideMovementInput, SERVIENTREGA,
};
pub use maintenance::{DuplicateSet, MaintenanceError, MaintenanceRepository};
pub use reference::{ProvisionReport, ReferenceData, ReferenceError, ReferenceRepository};
