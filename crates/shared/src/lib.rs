//! Shared types, errors, and configuration for Cashdesk.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding and tolerance with decimal precision
//! - Typed IDs for type-safe entity references
//! - Business-day ranges in the fixed business timezone
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
