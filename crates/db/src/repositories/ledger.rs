//! PostgreSQL implementation of the ledger store port.
//!
//! Each [`LedgerTransaction`] wraps one `SeaORM` database transaction.
//! Entry numbers come from an `UPDATE ... RETURNING` on the counter row,
//! whose row lock serializes concurrent creators until commit. The period
//! claim is a conditional update, so of two concurrent claimants the
//! second blocks on the row and then matches nothing.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_core::ledger::types::{Account, JournalEntry, JournalLine, Side};
use ledgerline_core::period::MonthlyPeriod;
use ledgerline_core::store::{AccountTotals, LedgerStore, LedgerTransaction, StoreError};
use ledgerline_core::workflow::EntryStatus;
use ledgerline_shared::types::{AccountId, Amount, JournalEntryId, MonthlyPeriodId};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::mapping::{
    account_from_model, entry_from_model, entry_to_active, line_to_active, period_from_model,
    period_to_active, store_err,
};
use crate::entities::{
    accounts, entry_counters, journal_entries, journal_entry_lines, monthly_periods,
    sea_orm_active_enums as db,
};

/// Ledger store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a new store.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError> {
        let txn = self.db.begin().await.map_err(store_err)?;
        Ok(Box::new(PgTransaction { txn }))
    }
}

struct PgTransaction {
    txn: DatabaseTransaction,
}

fn statuses_filter(statuses: &[EntryStatus]) -> Vec<db::EntryStatus> {
    statuses.iter().map(|s| db::EntryStatus::from(*s)).collect()
}

#[async_trait]
impl LedgerTransaction for PgTransaction {
    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.clone()))
            .all(&self.txn)
            .await
            .map_err(store_err)?;

        let parents: HashSet<Uuid> = accounts::Entity::find()
            .filter(accounts::Column::ParentId.is_in(ids))
            .select_only()
            .column(accounts::Column::ParentId)
            .into_tuple::<Option<Uuid>>()
            .all(&self.txn)
            .await
            .map_err(store_err)?
            .into_iter()
            .flatten()
            .collect();

        Ok(models
            .into_iter()
            .map(|m| {
                let has_children = parents.contains(&m.id);
                account_from_model(m, has_children)
            })
            .collect())
    }

    async fn find_monthly_period(
        &mut self,
        id: MonthlyPeriodId,
    ) -> Result<Option<MonthlyPeriod>, StoreError> {
        let model = monthly_periods::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(period_from_model))
    }

    async fn find_closed_periods_containing(
        &mut self,
        date: NaiveDate,
    ) -> Result<Vec<MonthlyPeriod>, StoreError> {
        let models = monthly_periods::Entity::find()
            .filter(monthly_periods::Column::IsClosed.eq(true))
            .filter(monthly_periods::Column::StartDate.lte(date))
            .filter(monthly_periods::Column::EndDate.gte(date))
            .order_by_asc(monthly_periods::Column::StartDate)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(period_from_model).collect())
    }

    async fn update_monthly_period(&mut self, period: &MonthlyPeriod) -> Result<(), StoreError> {
        period_to_active(period)
            .update(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn claim_opening_balance(&mut self, id: MonthlyPeriodId) -> Result<bool, StoreError> {
        let result = monthly_periods::Entity::update_many()
            .col_expr(monthly_periods::Column::HasOpeningBalance, Expr::value(true))
            .filter(monthly_periods::Column::Id.eq(id.into_inner()))
            .filter(monthly_periods::Column::HasOpeningBalance.eq(false))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn increment_entry_counter(&mut self) -> Result<Option<u64>, StoreError> {
        let rows = entry_counters::Entity::update_many()
            .col_expr(
                entry_counters::Column::Value,
                Expr::col(entry_counters::Column::Value).add(1),
            )
            .filter(entry_counters::Column::Name.eq(entry_counters::JOURNAL_ENTRY_COUNTER))
            .exec_with_returning(&self.txn)
            .await
            .map_err(store_err)?;

        rows.first()
            .map(|row| {
                u64::try_from(row.value)
                    .map_err(|_| StoreError::Backend(format!("negative entry counter {}", row.value)))
            })
            .transpose()
    }

    async fn seed_entry_counter(&mut self, value: u64) -> Result<(), StoreError> {
        let value = i64::try_from(value)
            .map_err(|_| StoreError::Backend(format!("entry counter {value} out of range")))?;
        entry_counters::Entity::insert(entry_counters::ActiveModel {
            name: Set(entry_counters::JOURNAL_ENTRY_COUNTER.to_string()),
            value: Set(value),
        })
        .on_conflict(
            OnConflict::column(entry_counters::Column::Name)
                .update_column(entry_counters::Column::Value)
                .to_owned(),
        )
        .exec(&self.txn)
        .await
        .map_err(store_err)?;
        debug!(value, "Entry counter seeded");
        Ok(())
    }

    async fn max_entry_number(&mut self) -> Result<Option<u64>, StoreError> {
        let max: Option<Option<i64>> = journal_entries::Entity::find()
            .select_only()
            .column_as(journal_entries::Column::EntryNumber.max(), "max_number")
            .into_tuple()
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(max.flatten().and_then(|n| u64::try_from(n).ok()))
    }

    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        journal_entries::Entity::insert(entry_to_active(entry)?)
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        self.insert_lines(entry.id, &entry.lines).await
    }

    async fn find_entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        let Some(model) = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(None);
        };

        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(model.id))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(&self.txn)
            .await
            .map_err(store_err)?;

        entry_from_model(model, lines).map(Some)
    }

    async fn update_entry_header(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        entry_to_active(entry)?
            .update(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn insert_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Ok(());
        }
        let models = lines
            .iter()
            .map(|l| line_to_active(entry_id, l))
            .collect::<Result<Vec<_>, _>>()?;
        journal_entry_lines::Entity::insert_many(models)
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete_lines(&mut self, entry_id: JournalEntryId) -> Result<u64, StoreError> {
        let result = journal_entry_lines::Entity::delete_many()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(entry_id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected)
    }

    async fn delete_entry_header(&mut self, entry_id: JournalEntryId) -> Result<(), StoreError> {
        let result = journal_entries::Entity::delete_by_id(entry_id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        if result.rows_affected == 0 {
            return Err(StoreError::RowNotFound(format!("journal entry {entry_id}")));
        }
        Ok(())
    }

    async fn account_totals_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[EntryStatus],
    ) -> Result<Vec<AccountTotals>, StoreError> {
        let rows: Vec<(Uuid, db::EntrySide, Decimal)> = journal_entry_lines::Entity::find()
            .join(
                JoinType::InnerJoin,
                journal_entry_lines::Relation::JournalEntries.def(),
            )
            .filter(journal_entries::Column::EntryDate.gte(start))
            .filter(journal_entries::Column::EntryDate.lte(end))
            .filter(journal_entries::Column::Status.is_in(statuses_filter(statuses)))
            .select_only()
            .column(journal_entry_lines::Column::AccountId)
            .column(journal_entry_lines::Column::Side)
            .column_as(journal_entry_lines::Column::Amount.sum(), "total")
            .group_by(journal_entry_lines::Column::AccountId)
            .group_by(journal_entry_lines::Column::Side)
            .into_tuple()
            .all(&self.txn)
            .await
            .map_err(store_err)?;

        let mut totals: BTreeMap<Uuid, (Amount, Amount)> = BTreeMap::new();
        for (account_id, side, total) in rows {
            let slot = totals.entry(account_id).or_default();
            match Side::from(side) {
                Side::Debit => slot.0 += Amount::from(total),
                Side::Credit => slot.1 += Amount::from(total),
            }
        }
        Ok(totals
            .into_iter()
            .map(|(account_id, (debit, credit))| AccountTotals {
                account_id: AccountId::from_uuid(account_id),
                debit,
                credit,
            })
            .collect())
    }

    async fn count_entries_in_period(
        &mut self,
        period: MonthlyPeriodId,
        statuses: &[EntryStatus],
    ) -> Result<u64, StoreError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::MonthlyPeriodId.eq(period.into_inner()));
        if !statuses.is_empty() {
            query = query.filter(journal_entries::Column::Status.is_in(statuses_filter(statuses)));
        }
        query.count(&self.txn).await.map_err(store_err)
    }

    async fn find_opening_entry(
        &mut self,
        period: MonthlyPeriodId,
    ) -> Result<Option<JournalEntryId>, StoreError> {
        let id: Option<Uuid> = journal_entries::Entity::find()
            .filter(journal_entries::Column::MonthlyPeriodId.eq(period.into_inner()))
            .filter(journal_entries::Column::IsOpening.eq(true))
            .select_only()
            .column(journal_entries::Column::Id)
            .into_tuple()
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(id.map(JournalEntryId::from_uuid))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_err)
    }
}
