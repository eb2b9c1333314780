//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{Amount, BALANCE_TOLERANCE, MAX_LINE_AMOUNT, MONEY_SCALE, STORAGE_SCALE};
