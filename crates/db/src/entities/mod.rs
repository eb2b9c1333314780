//! `SeaORM` entity definitions for the ledger schema.

pub mod accounts;
pub mod entry_counters;
pub mod fiscal_periods;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod monthly_periods;
pub mod sea_orm_active_enums;
