//! Ledger domain types: accounts, journal entries, and their lines.
//!
//! A journal entry is the unit of double-entry bookkeeping. Its lines each
//! carry a strictly positive amount on exactly one side, and the entry is
//! never persisted unless its debit and credit totals agree within
//! [`BALANCE_TOLERANCE`](ledgerline_shared::types::BALANCE_TOLERANCE).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{
    AccountId, Amount, FiscalPeriodId, JournalEntryId, JournalLineId, MonthlyPeriodId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::workflow::EntryStatus;

/// Side of a journal line.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl Side {
    /// Returns the string representation of the side.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Returns the other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Net movement of an account whose natural balance is on this side.
    ///
    /// Debit-natured: `debit - credit`. Credit-natured: `credit - debit`.
    #[must_use]
    pub fn natural_balance(self, debit: Amount, credit: Amount) -> Amount {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    /// Things the organization owns.
    Asset,
    /// Amounts the organization owes.
    Liability,
    /// Owners' residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Operating expense.
    Expense,
    /// Cost of goods or services sold.
    Cost,
    /// Off-balance memorandum account; never carried forward.
    Memo,
}

impl AccountClass {
    /// Returns the string representation of the class.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Cost => "cost",
            Self::Memo => "memo",
        }
    }

    /// Natural side for accounts of this class.
    #[must_use]
    pub fn default_normal_side(self) -> Side {
        match self {
            Self::Asset | Self::Expense | Self::Cost | Self::Memo => Side::Debit,
            Self::Liability | Self::Equity | Self::Revenue => Side::Credit,
        }
    }

    /// Revenue, expense, and cost accounts.
    #[must_use]
    pub fn is_income_statement(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense | Self::Cost)
    }

    /// Asset, liability, and equity accounts.
    #[must_use]
    pub fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Sortable account code (e.g., "1100").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub class: AccountClass,
    /// Side on which a positive balance sits.
    pub normal_side: Side,
    /// Parent account in the hierarchy.
    pub parent_id: Option<AccountId>,
    /// Group account: flagged as such or named as parent by another account.
    pub is_group: bool,
}

impl Account {
    /// Creates a leaf account with the class's default natural side.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, class: AccountClass) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            class,
            normal_side: class.default_normal_side(),
            parent_id: None,
            is_group: false,
        }
    }

    /// Returns true if lines may post directly to this account.
    #[must_use]
    pub fn is_postable(&self) -> bool {
        !self.is_group
    }
}

/// Sequential, human-facing journal entry number.
///
/// Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryNumber(u64);

impl EntryNumber {
    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for EntryNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of period-end adjustment an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Depreciation or amortization.
    Depreciation,
    /// Accrued income or expense.
    Accrual,
    /// Deferred income or expense.
    Deferral,
    /// Prepaid expense release.
    Prepayment,
    /// Provision or allowance.
    Provision,
    /// Correction of an earlier entry.
    Correction,
    /// Anything else.
    Other,
}

/// Adjustment tagging. Descriptive only; carries no posting semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// What kind of adjustment this is.
    pub kind: AdjustmentKind,
    /// The entry being adjusted, if any.
    pub adjusts_entry_id: Option<JournalEntryId>,
}

/// A validated, persisted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// 1-based position in input order.
    pub line_number: u32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: Side,
    /// Strictly positive amount, 4 decimal places.
    pub amount: Amount,
    /// Optional line memo.
    pub description: Option<String>,
}

impl JournalLine {
    /// Amount on the debit side, zero for credit lines.
    #[must_use]
    pub fn debit(&self) -> Amount {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => Amount::ZERO,
        }
    }

    /// Amount on the credit side, zero for debit lines.
    #[must_use]
    pub fn credit(&self) -> Amount {
        match self.side {
            Side::Credit => self.amount,
            Side::Debit => Amount::ZERO,
        }
    }
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Σdebit rounded to 2 places.
    pub total_debit: Amount,
    /// Σcredit rounded to 2 places.
    pub total_credit: Amount,
    /// Totals agree within tolerance.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Rounds each side independently and compares within tolerance.
    #[must_use]
    pub fn new(debit_sum: Amount, credit_sum: Amount) -> Self {
        let total_debit = debit_sum.round_money();
        let total_credit = credit_sum.round_money();
        Self {
            total_debit,
            total_credit,
            is_balanced: total_debit.within_tolerance(total_credit),
        }
    }

    /// Computes totals over persisted lines, or `None` if a side overflows.
    #[must_use]
    pub fn from_lines(lines: &[JournalLine]) -> Option<Self> {
        Some(Self::new(
            Amount::checked_sum(lines.iter().map(JournalLine::debit))?,
            Amount::checked_sum(lines.iter().map(JournalLine::credit))?,
        ))
    }

    /// Signed `total_debit - total_credit`.
    #[must_use]
    pub fn difference(&self) -> Amount {
        self.total_debit - self.total_credit
    }
}

/// Header fields a caller supplies on create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    pub description: String,
    /// External reference (invoice number, etc.).
    #[serde(default)]
    pub reference: Option<String>,
    /// Monthly period the entry belongs to.
    pub monthly_period_id: MonthlyPeriodId,
    /// Adjustment tagging.
    #[serde(default)]
    pub adjustment: Option<Adjustment>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A journal entry with its lines and audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Sequential number, unique across all entries.
    pub entry_number: EntryNumber,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Monthly period.
    pub monthly_period_id: MonthlyPeriodId,
    /// Fiscal period owning the monthly period.
    pub fiscal_period_id: FiscalPeriodId,
    /// Σdebit, 2 places.
    pub total_debit: Amount,
    /// Σcredit, 2 places.
    pub total_credit: Amount,
    /// Totals agree within tolerance.
    pub is_balanced: bool,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Adjustment tagging.
    pub adjustment: Option<Adjustment>,
    /// Opening-balance entry of a period transition.
    pub is_opening: bool,
    /// Free-form notes; void annotations are appended here.
    pub notes: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last editor.
    pub updated_by: UserId,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Who submitted the entry for approval.
    pub submitted_by: Option<UserId>,
    /// When the entry was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Who voided the entry.
    pub voided_by: Option<UserId>,
    /// When the entry was voided.
    pub voided_at: Option<DateTime<Utc>>,
    /// Why the entry was voided.
    pub void_reason: Option<String>,
    /// Lines in input order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Returns the entry's totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals {
            total_debit: self.total_debit,
            total_credit: self.total_credit,
            is_balanced: self.is_balanced,
        }
    }

    /// Replaces the lines and recomputes the stored totals.
    pub fn set_lines(&mut self, lines: Vec<JournalLine>, totals: EntryTotals) {
        self.lines = lines;
        self.total_debit = totals.total_debit;
        self.total_credit = totals.total_credit;
        self.is_balanced = totals.is_balanced;
    }
}
