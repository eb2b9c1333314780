//! Persistence port.
//!
//! Services never talk to a database directly. Every operation opens one
//! [`LedgerTransaction`] through [`LedgerStore::begin`], performs its reads
//! and writes on it, and either commits or drops it. Dropping an
//! uncommitted transaction discards all of its writes.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, Amount, JournalEntryId, MonthlyPeriodId};
use thiserror::Error;
use tracing::warn;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Account, JournalEntry, JournalLine};
use crate::period::types::MonthlyPeriod;
use crate::workflow::EntryStatus;

pub use memory::{FailPoint, InMemoryStore};

/// Unique constraint on `journal_entries.entry_number`.
pub const ENTRY_NUMBER_CONSTRAINT: &str = "uq_journal_entries_entry_number";

/// Partial unique constraint allowing one opening entry per monthly period.
pub const OPENING_ENTRY_CONSTRAINT: &str = "uq_journal_entries_opening_period";

/// Unique constraint on `(journal_entry_id, account_id)` of entry lines.
pub const ENTRY_ACCOUNT_CONSTRAINT: &str = "uq_journal_entry_lines_entry_account";

/// Errors raised by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the backend message,
    /// which names the constraint.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// An update or delete targeted a row that does not exist.
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// The store cannot be reached or timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if this is a unique violation on `constraint`.
    #[must_use]
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(message) if message.contains(constraint))
    }
}

/// Per-account debit and credit sums over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountTotals {
    /// The account.
    pub account_id: AccountId,
    /// Σdebit.
    pub debit: Amount,
    /// Σcredit.
    pub credit: Amount,
}

/// Entry point into a ledger store.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError>;
}

/// One unit of work. Nothing is visible to other transactions until
/// [`commit`](Self::commit) succeeds.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Loads the accounts with the given ids. Unknown ids are skipped.
    ///
    /// `Account::is_group` is true when the account is flagged as a group
    /// or any account names it as parent.
    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError>;

    /// Loads a monthly period.
    async fn find_monthly_period(
        &mut self,
        id: MonthlyPeriodId,
    ) -> Result<Option<MonthlyPeriod>, StoreError>;

    /// Closed monthly periods whose date range contains `date`.
    async fn find_closed_periods_containing(
        &mut self,
        date: NaiveDate,
    ) -> Result<Vec<MonthlyPeriod>, StoreError>;

    /// Persists every mutable field of a monthly period.
    async fn update_monthly_period(&mut self, period: &MonthlyPeriod) -> Result<(), StoreError>;

    /// Atomically flips `has_opening_balance` from false to true.
    ///
    /// Returns false when the flag was already set, so exactly one of any
    /// number of concurrent claimants sees true.
    async fn claim_opening_balance(&mut self, id: MonthlyPeriodId) -> Result<bool, StoreError>;

    /// Increments the entry counter and returns the new value, or `None`
    /// when the counter row does not exist.
    async fn increment_entry_counter(&mut self) -> Result<Option<u64>, StoreError>;

    /// Creates or overwrites the entry counter.
    async fn seed_entry_counter(&mut self, value: u64) -> Result<(), StoreError>;

    /// Largest entry number in use.
    async fn max_entry_number(&mut self) -> Result<Option<u64>, StoreError>;

    /// Inserts an entry header and its lines.
    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Loads an entry with its lines.
    async fn find_entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Persists every header field of an existing entry. Lines are untouched.
    async fn update_entry_header(&mut self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Inserts lines for an existing entry.
    async fn insert_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError>;

    /// Deletes all lines of an entry and returns how many were removed.
    async fn delete_lines(&mut self, entry_id: JournalEntryId) -> Result<u64, StoreError>;

    /// Deletes an entry header. Its lines must already be gone.
    async fn delete_entry_header(&mut self, entry_id: JournalEntryId) -> Result<(), StoreError>;

    /// Sums debits and credits per account over entries dated in
    /// `start..=end` whose status is one of `statuses`.
    async fn account_totals_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[EntryStatus],
    ) -> Result<Vec<AccountTotals>, StoreError>;

    /// Counts entries assigned to a period, optionally restricted to
    /// `statuses` (empty means every status).
    async fn count_entries_in_period(
        &mut self,
        period: MonthlyPeriodId,
        statuses: &[EntryStatus],
    ) -> Result<u64, StoreError>;

    /// The opening-balance entry of a period, if one exists.
    async fn find_opening_entry(
        &mut self,
        period: MonthlyPeriodId,
    ) -> Result<Option<JournalEntryId>, StoreError>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Commits `tx` when `result` is `Ok`, rolls it back otherwise.
pub(crate) async fn finish<T>(
    tx: Box<dyn LedgerTransaction>,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed after {}", e.error_code());
            }
            Err(e)
        }
    }
}
