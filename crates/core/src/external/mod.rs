//! External-service (courier) balance rules.
//!
//! Guide income arrives as a mix of notes, coins and bank deposits. The split
//! rules and the assigned/used counter rules are pure; the ledger writes are
//! done by `ExternalServiceLedger` in the db crate.

pub mod counters;
pub mod split;

pub use counters::{CounterError, ServiceCounters};
pub use split::{CashSplit, floor_decrement, normalize_split};
