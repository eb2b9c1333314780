//! Period domain types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{
    AccountId, Amount, FiscalPeriodId, JournalEntryId, MonthlyPeriodId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;
use crate::ledger::types::EntryNumber;

/// A monthly accounting period within a fiscal period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    /// Unique identifier.
    pub id: MonthlyPeriodId,
    /// Owning fiscal period.
    pub fiscal_period_id: FiscalPeriodId,
    /// Period name (e.g., "January 2026").
    pub name: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// No entries may be created or edited in a closed period.
    pub is_closed: bool,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Entries may be dated outside `start_date..=end_date`.
    pub allow_out_of_range_dates: bool,
    /// Opening balances have been claimed for this period.
    pub has_opening_balance: bool,
    /// The opening-balance entry, once written.
    pub opening_entry_id: Option<JournalEntryId>,
}

impl MonthlyPeriod {
    /// Creates an open period.
    #[must_use]
    pub fn new(
        fiscal_period_id: FiscalPeriodId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: MonthlyPeriodId::new(),
            fiscal_period_id,
            name: name.into(),
            start_date,
            end_date,
            is_closed: false,
            closed_by: None,
            closed_at: None,
            allow_out_of_range_dates: false,
            has_opening_balance: false,
            opening_entry_id: None,
        }
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if an entry dated `date` may be assigned to this period.
    #[must_use]
    pub fn accepts_date(&self, date: NaiveDate) -> bool {
        self.allow_out_of_range_dates || self.contains_date(date)
    }

    /// Fails if the period is closed.
    pub fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.is_closed {
            Err(LedgerError::PeriodClosed {
                period: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Fails if `date` falls outside the period and the period does not allow it.
    pub fn ensure_accepts(&self, date: NaiveDate) -> Result<(), LedgerError> {
        if self.accepts_date(date) {
            Ok(())
        } else {
            Err(LedgerError::DateOutOfRange {
                date,
                period: self.name.clone(),
                start: self.start_date,
                end: self.end_date,
            })
        }
    }

    /// Fails unless an entry dated `date` may be created or edited here.
    pub fn ensure_postable(&self, date: NaiveDate) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.ensure_accepts(date)
    }
}

/// Result of a read-only reopening readiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    /// Every precondition holds.
    pub ready: bool,
    /// "Ready" or the first failing precondition.
    pub message: String,
    /// Error code of the failing precondition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

/// Parameters for carrying balances into a new period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReopenRequest {
    /// The closed period whose balances are carried forward.
    pub source_period_id: MonthlyPeriodId,
    /// The open, empty period receiving the opening entry.
    pub target_period_id: MonthlyPeriodId,
    /// Who performs the transition.
    pub actor: UserId,
    /// Date of the opening entry.
    pub opening_date: NaiveDate,
    /// Notes stored on the opening entry.
    #[serde(default)]
    pub notes: Option<String>,
    /// Equity account receiving the source period's result.
    #[serde(default)]
    pub retained_earnings_account: Option<AccountId>,
}

/// What a successful transition produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReopenOutcome {
    /// The opening-balance entry.
    pub opening_entry_id: JournalEntryId,
    /// Its number.
    pub entry_number: EntryNumber,
    /// Σ natural balances of asset accounts.
    pub total_assets: Amount,
    /// Σ natural balances of liability accounts.
    pub total_liabilities: Amount,
    /// Σ natural balances of equity accounts, including the carried result.
    pub total_equity: Amount,
    /// Lines on the opening entry.
    pub line_count: usize,
}
