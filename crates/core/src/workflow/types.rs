//! Workflow domain types for journal entry lifecycle management.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Journal entry status.
///
/// The valid transitions are:
/// - Draft → Pending (submit)
/// - Draft | Pending → Approved (approve)
/// - Draft | Pending → Voided (void)
///
/// Posted is only ever assigned at creation, to opening-balance entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted and can be modified.
    Draft,
    /// Entry has been submitted for approval and can still be modified.
    Pending,
    /// Entry has been approved and counts toward balances (immutable).
    Approved,
    /// Entry was generated by a period transition (immutable).
    Posted,
    /// Entry has been voided (immutable).
    Voided,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Posted => "posted",
            Self::Voided => "voided",
        }
    }

    /// Returns true if the entry's header and lines can be changed or deleted.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        !self.is_editable()
    }

    /// Returns true if the entry's lines count toward account balances.
    #[must_use]
    pub fn counts_toward_balances(&self) -> bool {
        matches!(self, Self::Approved | Self::Posted)
    }

    /// Statuses whose lines count toward account balances.
    pub const BALANCE_BEARING: [Self; 2] = [Self::Approved, Self::Posted];

    /// Statuses that block closing a period.
    pub const UNFINISHED: [Self; 2] = [Self::Draft, Self::Pending];
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft entry for approval.
    Submit {
        /// The new status after submission.
        new_status: EntryStatus,
        /// The user who submitted the entry.
        submitted_by: UserId,
        /// When the entry was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a draft or pending entry.
    Approve {
        /// The new status after approval.
        new_status: EntryStatus,
        /// The user who approved the entry.
        approved_by: UserId,
        /// When the entry was approved.
        approved_at: DateTime<Utc>,
    },
    /// Void a draft or pending entry.
    Void {
        /// The new status after voiding.
        new_status: EntryStatus,
        /// The user who voided the entry.
        voided_by: UserId,
        /// When the entry was voided.
        voided_at: DateTime<Utc>,
        /// The reason for voiding.
        void_reason: String,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> EntryStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Void { new_status, .. } => *new_status,
        }
    }
}
