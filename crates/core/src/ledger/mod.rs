//! Double-entry bookkeeping logic.
//!
//! - `types` - Accounts, journal entries, and lines
//! - `validation` - The balance validator
//! - `balance` - Per-account natural balances
//! - `error` - Error type shared by the journal and period services

pub mod balance;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::AccountBalance;
pub use error::LedgerError;
pub use types::{
    Account, AccountClass, Adjustment, AdjustmentKind, EntryHeader, EntryNumber, EntryTotals,
    JournalEntry, JournalLine, Side,
};
pub use validation::{
    BalanceCheck, LineAmount, LineInput, ValidatedLines, ValidationError, validate_lines,
};
