//! Period close and transition service.
//!
//! Carrying balances forward is one transaction: claim the target period,
//! aggregate the source period, build and self-check the opening entry,
//! persist it, and link it to the target. Any failure rolls back the claim
//! with everything else, leaving the target eligible for a retry.

use std::collections::HashMap;
use std::sync::Arc;

use ledgerline_shared::types::{AccountId, JournalEntryId, MonthlyPeriodId, UserId};
use tracing::{error, info};

use super::closing::plan_opening_balances;
use super::types::{MonthlyPeriod, Readiness, ReopenOutcome, ReopenRequest};
use crate::clock::Clock;
use crate::journal::numbering::EntryNumbering;
use crate::journal::service::{ensure_date_in_open_period, insert_entry, load_period};
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Account, AccountClass, JournalEntry};
use crate::ledger::validation::validate_lines;
use crate::store::{LedgerStore, LedgerTransaction, finish};
use crate::workflow::EntryStatus;

/// Closes periods and carries their balances into the next one.
#[derive(Clone)]
pub struct PeriodService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    numbering: EntryNumbering,
}

impl PeriodService {
    /// Creates a new period service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, numbering: EntryNumbering) -> Self {
        Self {
            store,
            clock,
            numbering,
        }
    }

    /// Loads a monthly period.
    pub async fn get(&self, id: MonthlyPeriodId) -> Result<MonthlyPeriod, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = load_period(&mut *tx, id).await;
        finish(tx, result).await
    }

    /// Closes a monthly period.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`
    /// - `PeriodAlreadyClosed`
    /// - `UnapprovedEntriesRemain` while draft or pending entries sit in the period
    pub async fn close_period(
        &self,
        id: MonthlyPeriodId,
        actor: UserId,
    ) -> Result<MonthlyPeriod, LedgerError> {
        let mut tx = self.store.begin().await?;
        let now = self.clock.now();
        let result = async {
            let mut period = load_period(&mut *tx, id).await?;
            if period.is_closed {
                return Err(LedgerError::PeriodAlreadyClosed {
                    period: period.name,
                });
            }
            let count = tx
                .count_entries_in_period(id, &EntryStatus::UNFINISHED)
                .await?;
            if count > 0 {
                return Err(LedgerError::UnapprovedEntriesRemain {
                    period: period.name,
                    count,
                });
            }
            period.is_closed = true;
            period.closed_by = Some(actor);
            period.closed_at = Some(now);
            tx.update_monthly_period(&period).await?;
            Ok(period)
        }
        .await;
        let period = finish(tx, result).await?;

        info!(period_id = %id, period = %period.name, actor = %actor, "Period closed");
        Ok(period)
    }

    /// Reports whether `source` can be carried into `target`, without writing.
    ///
    /// Precondition failures are reported in the result; only store failures
    /// are errors.
    pub async fn verify_ready_for_reopening(
        &self,
        source: MonthlyPeriodId,
        target: MonthlyPeriodId,
    ) -> Result<Readiness, LedgerError> {
        let mut tx = self.store.begin().await?;
        let checked = check_preconditions(&mut *tx, source, target, None).await;
        tx.rollback().await?;

        match checked {
            Ok(_) => Ok(Readiness {
                ready: true,
                message: "Ready".to_string(),
                error_code: None,
            }),
            Err(e @ (LedgerError::Store(_) | LedgerError::CounterUnavailable)) => Err(e),
            Err(e) => Ok(Readiness {
                ready: false,
                message: e.to_string(),
                error_code: Some(e.error_code()),
            }),
        }
    }

    /// Writes the opening-balance entry of `target` from the closing
    /// balances of `source`.
    ///
    /// # Errors
    ///
    /// Every precondition has its own error (see [`LedgerError`]). Losing a
    /// race for the target yields `AlreadyReopened`. A generated entry that
    /// fails validation yields `InternalInvariant`.
    pub async fn reopen_period(&self, request: ReopenRequest) -> Result<ReopenOutcome, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = self.reopen_in(&mut *tx, &request).await;
        let outcome = finish(tx, result).await?;

        info!(
            source_period_id = %request.source_period_id,
            target_period_id = %request.target_period_id,
            opening_entry_id = %outcome.opening_entry_id,
            entry_number = %outcome.entry_number,
            lines = outcome.line_count,
            actor = %request.actor,
            "Opening balances created"
        );
        Ok(outcome)
    }

    async fn reopen_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        request: &ReopenRequest,
    ) -> Result<ReopenOutcome, LedgerError> {
        let (source, mut target) = check_preconditions(
            tx,
            request.source_period_id,
            request.target_period_id,
            Some(request.opening_date),
        )
        .await?;

        if !tx.claim_opening_balance(target.id).await? {
            return Err(LedgerError::AlreadyReopened {
                period: target.name,
            });
        }

        let totals = tx
            .account_totals_between(
                source.start_date,
                source.end_date,
                &EntryStatus::BALANCE_BEARING,
            )
            .await?;

        let mut ids: Vec<AccountId> = totals.iter().map(|t| t.account_id).collect();
        ids.extend(request.retained_earnings_account);
        let chart: HashMap<AccountId, Account> = tx
            .find_accounts(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let retained_earnings = match request.retained_earnings_account {
            Some(id) => Some(retained_earnings_account(&chart, id)?),
            None => None,
        };

        let plan = plan_opening_balances(&totals, &chart, retained_earnings)?;
        if plan.lines.is_empty() {
            return Err(LedgerError::NoBalancesToCarry {
                period: source.name,
            });
        }

        let validated = validate_lines(&plan.lines, |id| chart.get(id)).map_err(|e| {
            error!(
                source_period_id = %source.id,
                target_period_id = %target.id,
                error = %e,
                "Generated opening entry failed validation"
            );
            LedgerError::InternalInvariant(format!("opening entry for {}: {e}", target.name))
        })?;

        let entry_number = self.numbering.next_number(tx).await?;
        let now = self.clock.now();
        let mut entry = JournalEntry {
            id: JournalEntryId::new(),
            entry_number,
            entry_date: request.opening_date,
            description: format!("Opening balances for {} from {}", target.name, source.name),
            reference: None,
            monthly_period_id: target.id,
            fiscal_period_id: target.fiscal_period_id,
            total_debit: validated.totals.total_debit,
            total_credit: validated.totals.total_credit,
            is_balanced: validated.totals.is_balanced,
            status: EntryStatus::Posted,
            adjustment: None,
            is_opening: true,
            notes: request.notes.clone(),
            created_by: request.actor,
            created_at: now,
            updated_by: request.actor,
            updated_at: now,
            submitted_by: None,
            submitted_at: None,
            approved_by: Some(request.actor),
            approved_at: Some(now),
            voided_by: None,
            voided_at: None,
            void_reason: None,
            lines: Vec::new(),
        };
        entry.set_lines(validated.lines, validated.totals);
        insert_entry(tx, &entry).await.map_err(|e| match e {
            LedgerError::AlreadyReopened { .. } => LedgerError::AlreadyReopened {
                period: target.name.clone(),
            },
            other => other,
        })?;

        target.has_opening_balance = true;
        target.opening_entry_id = Some(entry.id);
        tx.update_monthly_period(&target).await?;

        Ok(ReopenOutcome {
            opening_entry_id: entry.id,
            entry_number,
            total_assets: plan.total_assets,
            total_liabilities: plan.total_liabilities,
            total_equity: plan.total_equity,
            line_count: entry.lines.len(),
        })
    }
}

/// Checks every transition precondition in order and returns both periods.
async fn check_preconditions(
    tx: &mut dyn LedgerTransaction,
    source_id: MonthlyPeriodId,
    target_id: MonthlyPeriodId,
    opening_date: Option<chrono::NaiveDate>,
) -> Result<(MonthlyPeriod, MonthlyPeriod), LedgerError> {
    let source = load_period(tx, source_id).await?;
    let target = load_period(tx, target_id).await?;

    if source.id == target.id {
        return Err(LedgerError::SamePeriod);
    }
    if target.start_date <= source.end_date {
        return Err(LedgerError::TargetNotAfterSource {
            source_period: source.name,
            target_period: target.name,
        });
    }
    if !source.is_closed {
        return Err(LedgerError::SourceNotClosed {
            period: source.name,
        });
    }
    if target.is_closed {
        return Err(LedgerError::TargetClosed {
            period: target.name,
        });
    }
    if target.has_opening_balance || tx.find_opening_entry(target.id).await?.is_some() {
        return Err(LedgerError::AlreadyReopened {
            period: target.name,
        });
    }
    let count = tx.count_entries_in_period(target.id, &[]).await?;
    if count > 0 {
        return Err(LedgerError::TargetNotEmpty {
            period: target.name,
            count,
        });
    }
    if let Some(date) = opening_date {
        target.ensure_accepts(date)?;
        ensure_date_in_open_period(tx, date).await?;
    }
    Ok((source, target))
}

fn retained_earnings_account(
    chart: &HashMap<AccountId, Account>,
    id: AccountId,
) -> Result<&Account, LedgerError> {
    match chart.get(&id) {
        Some(account) if account.class == AccountClass::Equity && account.is_postable() => {
            Ok(account)
        }
        _ => Err(LedgerError::InvalidRetainedEarningsAccount(id)),
    }
}
