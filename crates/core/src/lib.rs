//! Core journal logic for Ledgerline.
//!
//! Pure business logic with no web or database dependencies. Persistence
//! is reached through the [`store::LedgerStore`] port.
//!
//! # Modules
//!
//! - `ledger` - Accounts, journal entries, and the balance validator
//! - `workflow` - Entry lifecycle state machine
//! - `journal` - Entry numbering and the journal service
//! - `period` - Period close and opening balance transition
//! - `store` - Persistence port and in-memory store
//! - `clock` - Time source

pub mod clock;
pub mod journal;
pub mod ledger;
pub mod period;
pub mod store;
pub mod workflow;

#[cfg(test)]
mod test_support;
