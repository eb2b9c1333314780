//! Store implementations.
//!
//! The core crate reaches persistence only through its store port; this
//! module implements that port on top of `SeaORM`.

pub mod ledger;
pub mod mapping;

pub use ledger::PgLedgerStore;
