//! Workflow service for journal entry state transitions.
//!
//! This module implements the state machine that decides which lifecycle
//! transitions are legal. It performs no I/O: callers pass the current
//! status, the actor, and the time, and receive a [`WorkflowAction`] to
//! apply.

use chrono::{DateTime, SecondsFormat, Utc};
use ledgerline_shared::types::UserId;

use crate::ledger::types::JournalEntry;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Stateless service for managing journal entry workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft entry for approval.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Submit)` if the transition is valid
    /// * `Err(WorkflowError::InvalidTransition)` if not in Draft status
    pub fn submit(
        current_status: EntryStatus,
        submitted_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Draft => Ok(WorkflowAction::Submit {
                new_status: EntryStatus::Pending,
                submitted_by,
                submitted_at: at,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Pending,
            }),
        }
    }

    /// Approve a draft or pending entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` if the transition is valid
    /// * `Err(WorkflowError::InvalidTransition)` if already approved, posted, or voided
    pub fn approve(
        current_status: EntryStatus,
        approved_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Draft | EntryStatus::Pending => Ok(WorkflowAction::Approve {
                new_status: EntryStatus::Approved,
                approved_by,
                approved_at: at,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Approved,
            }),
        }
    }

    /// Void a draft or pending entry.
    ///
    /// Approved entries are corrected with a counter-entry instead.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Void)` if the transition is valid
    /// * `Err(WorkflowError::VoidReasonRequired)` if reason is blank
    /// * `Err(WorkflowError::InvalidTransition)` if approved, posted, or voided
    pub fn void(
        current_status: EntryStatus,
        voided_by: UserId,
        void_reason: &str,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        let void_reason = void_reason.trim();
        if void_reason.is_empty() {
            return Err(WorkflowError::VoidReasonRequired);
        }

        match current_status {
            EntryStatus::Draft | EntryStatus::Pending => Ok(WorkflowAction::Void {
                new_status: EntryStatus::Voided,
                voided_by,
                voided_at: at,
                void_reason: void_reason.to_string(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: EntryStatus::Voided,
            }),
        }
    }

    /// Fails unless an entry in `status` may have its header and lines replaced.
    pub fn ensure_editable(status: EntryStatus) -> Result<(), WorkflowError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::ImmutableEntry { status })
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Pending (submit)
    /// - Draft | Pending → Approved (approve)
    /// - Draft | Pending → Voided (void)
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        matches!(
            (from, to),
            (EntryStatus::Draft, EntryStatus::Pending)
                | (
                    EntryStatus::Draft | EntryStatus::Pending,
                    EntryStatus::Approved | EntryStatus::Voided
                )
        )
    }

    /// Applies `action` to `entry`: status, audit fields, and for voids the
    /// note annotation `[VOIDED <time> by <actor>] <reason>`.
    pub fn apply(action: WorkflowAction, entry: &mut JournalEntry) {
        entry.status = action.new_status();
        match action {
            WorkflowAction::Submit {
                submitted_by,
                submitted_at,
                ..
            } => {
                entry.submitted_by = Some(submitted_by);
                entry.submitted_at = Some(submitted_at);
                entry.updated_by = submitted_by;
                entry.updated_at = submitted_at;
            }
            WorkflowAction::Approve {
                approved_by,
                approved_at,
                ..
            } => {
                entry.approved_by = Some(approved_by);
                entry.approved_at = Some(approved_at);
                entry.updated_by = approved_by;
                entry.updated_at = approved_at;
            }
            WorkflowAction::Void {
                voided_by,
                voided_at,
                void_reason,
                ..
            } => {
                let annotation = format!(
                    "[VOIDED {} by {voided_by}] {void_reason}",
                    voided_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
                entry.notes = Some(match entry.notes.take() {
                    Some(notes) if !notes.is_empty() => format!("{notes}\n{annotation}"),
                    _ => annotation,
                });
                entry.voided_by = Some(voided_by);
                entry.voided_at = Some(voided_at);
                entry.void_reason = Some(void_reason);
                entry.updated_by = voided_by;
                entry.updated_at = voided_at;
            }
        }
    }
}
