//! Daily closing rules.
//!
//! A business day at a point moves through three states: no closure row,
//! open (cash counts may be saved as partial), and closed. Closed is terminal.
//! The storage protocol lives in the db crate; this module decides whether a
//! closing may happen and what it records.

pub mod detail;
pub mod state;
pub mod summary;

pub use detail::{ClosingDetailInput, Discrepancy, collect_discrepancies};
pub use state::{ClosingRejection, DayState, PointAccess, UserAccess, evaluate_closure};
pub use summary::{CurrencyDaySummary, DayActivity, DaySummary, MovementTotals, checked_total};
