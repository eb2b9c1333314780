//! Journal entry lifecycle service.
//!
//! Every public operation runs in a single store transaction: all reads,
//! checks, and writes happen on it and it is committed only when the whole
//! operation succeeded. Validation and state checks run before any write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, JournalEntryId, MonthlyPeriodId, UserId};
use tracing::info;

use super::numbering::EntryNumbering;
use crate::clock::Clock;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Account, Adjustment, EntryHeader, JournalEntry};
use crate::ledger::validation::{BalanceCheck, LineInput, ValidatedLines, validate_lines};
use crate::period::types::MonthlyPeriod;
use crate::store::{
    ENTRY_NUMBER_CONSTRAINT, LedgerStore, LedgerTransaction, OPENING_ENTRY_CONSTRAINT, finish,
};
use crate::workflow::{EntryStatus, WorkflowAction, WorkflowError, WorkflowService};

/// Creates, edits, and moves journal entries through their lifecycle.
#[derive(Clone)]
pub struct JournalService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    numbering: EntryNumbering,
}

impl JournalService {
    /// Creates a new journal service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, numbering: EntryNumbering) -> Self {
        Self {
            store,
            clock,
            numbering,
        }
    }

    /// Runs the balance validator against the current chart of accounts.
    ///
    /// Writes nothing. Validation failures are reported in the returned
    /// [`BalanceCheck`]; only store failures are errors.
    pub async fn validate_balance(&self, lines: &[LineInput]) -> Result<BalanceCheck, LedgerError> {
        let mut tx = self.store.begin().await?;
        let chart = load_chart(&mut *tx, lines).await;
        tx.rollback().await?;
        let chart = chart?;
        let result = validate_lines(lines, |id| chart.get(id));
        Ok(BalanceCheck::from_result(lines, &result))
    }

    /// Creates a draft entry.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`, `PeriodClosed`, `DateOutOfRange` for the period
    /// - `PeriodClosed` if the entry date falls inside any closed period
    /// - `EntryNotFound` if the adjustment references a missing entry
    /// - `Validation` if the lines fail the balance validator
    /// - `CounterUnavailable`, `DuplicateEntryNumber`, `Store` from persistence
    pub async fn create(
        &self,
        header: EntryHeader,
        lines: &[LineInput],
        actor: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = self.create_in(&mut *tx, header, lines, actor).await;
        let entry = finish(tx, result).await?;

        info!(
            entry_id = %entry.id,
            entry_number = %entry.entry_number,
            total = %entry.total_debit,
            actor = %actor,
            "Journal entry created"
        );
        Ok(entry)
    }

    async fn create_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        header: EntryHeader,
        lines: &[LineInput],
        actor: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let period = load_period(tx, header.monthly_period_id).await?;
        period.ensure_postable(header.entry_date)?;
        ensure_date_in_open_period(tx, header.entry_date).await?;
        ensure_adjustment_target(tx, header.adjustment.as_ref()).await?;
        let validated = validate_against_store(tx, lines).await?;

        let entry_number = self.numbering.next_number(tx).await?;
        let now = self.clock.now();
        let mut entry = JournalEntry {
            id: JournalEntryId::new(),
            entry_number,
            entry_date: header.entry_date,
            description: header.description,
            reference: header.reference,
            monthly_period_id: period.id,
            fiscal_period_id: period.fiscal_period_id,
            total_debit: validated.totals.total_debit,
            total_credit: validated.totals.total_credit,
            is_balanced: validated.totals.is_balanced,
            status: EntryStatus::Draft,
            adjustment: header.adjustment,
            is_opening: false,
            notes: header.notes,
            created_by: actor,
            created_at: now,
            updated_by: actor,
            updated_at: now,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            voided_by: None,
            voided_at: None,
            void_reason: None,
            lines: Vec::new(),
        };
        entry.set_lines(validated.lines, validated.totals);

        insert_entry(tx, &entry).await?;
        Ok(entry)
    }

    /// Loads an entry with its lines.
    pub async fn get(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = load_entry(&mut *tx, id).await;
        finish(tx, result).await
    }

    /// Replaces the header and all lines of a draft or pending entry.
    ///
    /// The entry keeps its number and status. Both the entry's current
    /// period and the new period must be open, and the new date may not fall
    /// inside any closed period.
    pub async fn update(
        &self,
        id: JournalEntryId,
        header: EntryHeader,
        lines: &[LineInput],
        actor: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = self.update_in(&mut *tx, id, header, lines, actor).await;
        let entry = finish(tx, result).await?;

        info!(
            entry_id = %entry.id,
            entry_number = %entry.entry_number,
            lines = entry.lines.len(),
            actor = %actor,
            "Journal entry updated"
        );
        Ok(entry)
    }

    async fn update_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        id: JournalEntryId,
        header: EntryHeader,
        lines: &[LineInput],
        actor: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let mut entry = load_entry(tx, id).await?;
        WorkflowService::ensure_editable(entry.status)?;

        let current = load_period(tx, entry.monthly_period_id).await?;
        current.ensure_open()?;
        let period = if header.monthly_period_id == current.id {
            current
        } else {
            load_period(tx, header.monthly_period_id).await?
        };
        period.ensure_postable(header.entry_date)?;
        ensure_date_in_open_period(tx, header.entry_date).await?;
        ensure_adjustment_target(tx, header.adjustment.as_ref()).await?;
        let validated = validate_against_store(tx, lines).await?;

        tx.delete_lines(id).await?;
        tx.insert_lines(id, &validated.lines).await?;

        entry.entry_date = header.entry_date;
        entry.description = header.description;
        entry.reference = header.reference;
        entry.monthly_period_id = period.id;
        entry.fiscal_period_id = period.fiscal_period_id;
        entry.adjustment = header.adjustment;
        entry.notes = header.notes;
        entry.updated_by = actor;
        entry.updated_at = self.clock.now();
        entry.set_lines(validated.lines, validated.totals);
        tx.update_entry_header(&entry).await?;
        Ok(entry)
    }

    /// Moves a draft entry to pending.
    pub async fn submit(&self, id: JournalEntryId, actor: UserId) -> Result<JournalEntry, LedgerError> {
        let entry = self
            .transition(id, |status, now| WorkflowService::submit(status, actor, now))
            .await?;
        info!(entry_id = %id, actor = %actor, "Journal entry submitted");
        Ok(entry)
    }

    /// Approves a draft or pending entry. Approved entries count toward balances.
    pub async fn approve(&self, id: JournalEntryId, actor: UserId) -> Result<JournalEntry, LedgerError> {
        let entry = self
            .transition(id, |status, now| WorkflowService::approve(status, actor, now))
            .await?;
        info!(entry_id = %id, actor = %actor, "Journal entry approved");
        Ok(entry)
    }

    /// Voids a draft or pending entry.
    ///
    /// The description is left untouched; the reason is recorded in
    /// `void_reason` and appended to the notes.
    pub async fn void(
        &self,
        id: JournalEntryId,
        actor: UserId,
        reason: &str,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = self
            .transition(id, |status, now| WorkflowService::void(status, actor, reason, now))
            .await?;
        info!(entry_id = %id, actor = %actor, "Journal entry voided");
        Ok(entry)
    }

    async fn transition<F>(&self, id: JournalEntryId, decide: F) -> Result<JournalEntry, LedgerError>
    where
        F: FnOnce(EntryStatus, DateTime<Utc>) -> Result<WorkflowAction, WorkflowError> + Send,
    {
        let mut tx = self.store.begin().await?;
        let now = self.clock.now();
        let result = async {
            let mut entry = load_entry(&mut *tx, id).await?;
            let action = decide(entry.status, now)?;
            WorkflowService::apply(action, &mut entry);
            tx.update_entry_header(&entry).await?;
            Ok::<_, LedgerError>(entry)
        }
        .await;
        finish(tx, result).await
    }

    /// Deletes a draft or pending entry and its lines.
    pub async fn delete(&self, id: JournalEntryId) -> Result<(), LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let entry = load_entry(&mut *tx, id).await?;
            WorkflowService::ensure_editable(entry.status)?;
            tx.delete_lines(id).await?;
            tx.delete_entry_header(id).await?;
            Ok::<_, LedgerError>(entry)
        }
        .await;
        let entry = finish(tx, result).await?;

        info!(
            entry_id = %id,
            entry_number = %entry.entry_number,
            "Journal entry deleted"
        );
        Ok(())
    }
}

pub(crate) async fn load_entry(
    tx: &mut dyn LedgerTransaction,
    id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    tx.find_entry(id).await?.ok_or(LedgerError::EntryNotFound(id))
}

pub(crate) async fn load_period(
    tx: &mut dyn LedgerTransaction,
    id: MonthlyPeriodId,
) -> Result<MonthlyPeriod, LedgerError> {
    tx.find_monthly_period(id)
        .await?
        .ok_or(LedgerError::PeriodNotFound(id))
}

/// Rejects dates inside a closed period, whichever period the entry is assigned to.
pub(crate) async fn ensure_date_in_open_period(
    tx: &mut dyn LedgerTransaction,
    date: NaiveDate,
) -> Result<(), LedgerError> {
    match tx.find_closed_periods_containing(date).await?.first() {
        Some(closed) => closed.ensure_open(),
        None => Ok(()),
    }
}

async fn load_chart(
    tx: &mut dyn LedgerTransaction,
    lines: &[LineInput],
) -> Result<HashMap<AccountId, Account>, LedgerError> {
    let ids: Vec<AccountId> = lines.iter().filter_map(|line| line.account_id).collect();
    let accounts = tx.find_accounts(&ids).await?;
    Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
}

/// Runs the balance validator with account lookups served by `tx`.
pub(crate) async fn validate_against_store(
    tx: &mut dyn LedgerTransaction,
    lines: &[LineInput],
) -> Result<ValidatedLines, LedgerError> {
    let chart = load_chart(tx, lines).await?;
    Ok(validate_lines(lines, |id| chart.get(id))?)
}

/// Inserts a numbered entry, reporting unique violations by what collided.
pub(crate) async fn insert_entry(
    tx: &mut dyn LedgerTransaction,
    entry: &JournalEntry,
) -> Result<(), LedgerError> {
    tx.insert_entry(entry).await.map_err(|e| {
        if e.violates(ENTRY_NUMBER_CONSTRAINT) {
            LedgerError::DuplicateEntryNumber(entry.entry_number)
        } else if e.violates(OPENING_ENTRY_CONSTRAINT) {
            LedgerError::AlreadyReopened {
                period: entry.monthly_period_id.to_string(),
            }
        } else {
            LedgerError::Store(e)
        }
    })
}

async fn ensure_adjustment_target(
    tx: &mut dyn LedgerTransaction,
    adjustment: Option<&Adjustment>,
) -> Result<(), LedgerError> {
    if let Some(target) = adjustment.and_then(|a| a.adjusts_entry_id) {
        load_entry(tx, target).await?;
    }
    Ok(())
}
