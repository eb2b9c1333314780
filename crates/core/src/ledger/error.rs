//! Ledger error types.
//!
//! [`LedgerError`] is what every journal and period service returns. It
//! wraps the validator, workflow, and store errors and adds the period,
//! concurrency, and internal-invariant failures the services detect
//! themselves. Each variant maps to exactly one [`ErrorCategory`].

use chrono::NaiveDate;
use ledgerline_shared::ErrorCategory;
use ledgerline_shared::types::{AccountId, Amount, JournalEntryId, MonthlyPeriodId};
use thiserror::Error;

use super::types::EntryNumber;
use super::validation::ValidationError;
use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// The lines failed balance validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The retained-earnings account is missing, not equity, or a group account.
    #[error("Account {0} cannot receive the period result; it must be a postable equity account")]
    InvalidRetainedEarningsAccount(AccountId),

    // ========== State Errors ==========
    /// Illegal lifecycle transition or edit of an immutable entry.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    // ========== Not Found ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Monthly period not found.
    #[error("Monthly period not found: {0}")]
    PeriodNotFound(MonthlyPeriodId),

    // ========== Period Errors ==========
    /// The period is closed, no posting allowed.
    #[error("Period {period} is closed, no posting allowed")]
    PeriodClosed {
        /// Period name.
        period: String,
    },

    /// The date falls outside the period.
    #[error("Date {date} is outside period {period} ({start} to {end})")]
    DateOutOfRange {
        /// The offending date.
        date: NaiveDate,
        /// Period name.
        period: String,
        /// First day of the period.
        start: NaiveDate,
        /// Last day of the period.
        end: NaiveDate,
    },

    /// The period is already closed.
    #[error("Period {period} is already closed")]
    PeriodAlreadyClosed {
        /// Period name.
        period: String,
    },

    /// Draft or pending entries still sit in the period.
    #[error("Cannot close period {period}: {count} draft or pending entries remain")]
    UnapprovedEntriesRemain {
        /// Period name.
        period: String,
        /// How many entries are unfinished.
        count: u64,
    },

    /// Source and target are the same period.
    #[error("Source and target period must differ")]
    SamePeriod,

    /// Target does not start after the source ends.
    #[error("Target period {target_period} must start after source period {source_period} ends")]
    TargetNotAfterSource {
        /// Source period name.
        source_period: String,
        /// Target period name.
        target_period: String,
    },

    /// Source period is still open.
    #[error("Source period {period} must be closed before its balances are carried forward")]
    SourceNotClosed {
        /// Period name.
        period: String,
    },

    /// Target period is closed.
    #[error("Target period {period} is closed")]
    TargetClosed {
        /// Period name.
        period: String,
    },

    /// Target period already holds entries.
    #[error("Target period {period} already has {count} journal entries")]
    TargetNotEmpty {
        /// Period name.
        period: String,
        /// Number of entries present.
        count: u64,
    },

    /// The source period has a profit or loss but no account to carry it to.
    #[error("Source period has an unclosed result of {amount}; a retained earnings account is required")]
    UnclosedPeriodResult {
        /// Credit-minus-debit result of income statement accounts.
        amount: Amount,
    },

    /// Nothing to carry forward.
    #[error("Source period {period} has no balances to carry forward")]
    NoBalancesToCarry {
        /// Period name.
        period: String,
    },

    // ========== Concurrency Errors ==========
    /// Opening balances were already created for the target period.
    #[error("Opening balances already exist for period {period}")]
    AlreadyReopened {
        /// Period name.
        period: String,
    },

    /// Another writer took the same entry number.
    #[error("Entry number {0} is already in use, please retry")]
    DuplicateEntryNumber(EntryNumber),

    // ========== Store Errors ==========
    /// The entry counter row is missing and the scan fallback is disabled.
    #[error("Entry number counter is unavailable")]
    CounterUnavailable,

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    // ========== Internal ==========
    /// A self-generated artifact failed its own consistency check.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl LedgerError {
    /// Returns the category deciding how the error is reported.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InvalidRetainedEarningsAccount(_) => {
                ErrorCategory::Validation
            }
            Self::Workflow(WorkflowError::VoidReasonRequired) => ErrorCategory::Validation,
            Self::Workflow(_) => ErrorCategory::State,
            Self::EntryNotFound(_) | Self::PeriodNotFound(_) => ErrorCategory::NotFound,
            Self::PeriodClosed { .. }
            | Self::DateOutOfRange { .. }
            | Self::PeriodAlreadyClosed { .. }
            | Self::UnapprovedEntriesRemain { .. }
            | Self::SamePeriod
            | Self::TargetNotAfterSource { .. }
            | Self::SourceNotClosed { .. }
            | Self::TargetClosed { .. }
            | Self::TargetNotEmpty { .. }
            | Self::UnclosedPeriodResult { .. }
            | Self::NoBalancesToCarry { .. } => ErrorCategory::Period,
            Self::AlreadyReopened { .. } | Self::DuplicateEntryNumber(_) => {
                ErrorCategory::Concurrency
            }
            Self::CounterUnavailable | Self::Store(_) => ErrorCategory::Store,
            Self::InternalInvariant(_) => ErrorCategory::InternalInvariant,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::InvalidRetainedEarningsAccount(_) => "INVALID_RETAINED_EARNINGS_ACCOUNT",
            Self::Workflow(e) => e.error_code(),
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::DateOutOfRange { .. } => "DATE_OUT_OF_RANGE",
            Self::PeriodAlreadyClosed { .. } => "PERIOD_ALREADY_CLOSED",
            Self::UnapprovedEntriesRemain { .. } => "UNAPPROVED_ENTRIES_REMAIN",
            Self::SamePeriod => "SAME_PERIOD",
            Self::TargetNotAfterSource { .. } => "TARGET_NOT_AFTER_SOURCE",
            Self::SourceNotClosed { .. } => "SOURCE_NOT_CLOSED",
            Self::TargetClosed { .. } => "TARGET_CLOSED",
            Self::TargetNotEmpty { .. } => "TARGET_NOT_EMPTY",
            Self::UnclosedPeriodResult { .. } => "UNCLOSED_PERIOD_RESULT",
            Self::NoBalancesToCarry { .. } => "NO_BALANCES_TO_CARRY",
            Self::AlreadyReopened { .. } => "ALREADY_REOPENED",
            Self::DuplicateEntryNumber(_) => "DUPLICATE_ENTRY_NUMBER",
            Self::CounterUnavailable => "COUNTER_UNAVAILABLE",
            Self::Store(_) => "STORE_ERROR",
            Self::InternalInvariant(_) => "INTERNAL_INVARIANT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.category().status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
