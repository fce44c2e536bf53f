//! Core business logic for Cashdesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Movement sign normalization and cash balance folding
//! - `closing` - Daily closing state machine and discrepancy rules
//! - `external` - External-service (courier) cash split and credit rules
//! - `maintenance` - Batch reconciliation and duplicate detection rules

pub mod closing;
pub mod external;
pub mod ledger;
pub mod maintenance;
