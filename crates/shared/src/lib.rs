//! Shared types, errors, and configuration for Ledgerline.
//!
//! This crate provides common types used across all other crates:
//! - `Amount`, the fixed-point money type every total goes through
//! - Typed IDs for type-safe entity references
//! - The error taxonomy shared by the services and the HTTP layer
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::ErrorCategory;
pub use types::{Amount, BALANCE_TOLERANCE};
