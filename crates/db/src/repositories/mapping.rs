//! Conversions between `SeaORM` models and core domain types.

use chrono::Utc;
use ledgerline_core::ledger::types::{
    Account, AccountClass, Adjustment, AdjustmentKind, EntryNumber, JournalEntry, JournalLine,
    Side,
};
use ledgerline_core::period::MonthlyPeriod;
use ledgerline_core::store::StoreError;
use ledgerline_core::workflow::EntryStatus;
use ledgerline_shared::types::{
    AccountId, Amount, FiscalPeriodId, JournalEntryId, JournalLineId, MonthlyPeriodId, UserId,
};
use sea_orm::ActiveValue::Set;
use sea_orm::DbErr;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{RuntimeErr, SqlErr};

use crate::entities::{
    accounts, journal_entries, journal_entry_lines, monthly_periods, sea_orm_active_enums as db,
};

/// Maps a database error onto the store port's error.
///
/// Unique violations keep the backend message so callers can tell which
/// constraint fired.
pub fn store_err(err: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        return StoreError::UniqueViolation(message);
    }
    match err {
        DbErr::RecordNotFound(what) => StoreError::RowNotFound(what),
        DbErr::RecordNotUpdated => StoreError::RowNotFound("no row updated".to_string()),
        DbErr::ConnectionAcquire(e) => StoreError::Unavailable(e.to_string()),
        DbErr::Conn(RuntimeErr::SqlxError(e)) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

// ========== Enums ==========

impl From<db::AccountClass> for AccountClass {
    fn from(value: db::AccountClass) -> Self {
        match value {
            db::AccountClass::Asset => Self::Asset,
            db::AccountClass::Liability => Self::Liability,
            db::AccountClass::Equity => Self::Equity,
            db::AccountClass::Revenue => Self::Revenue,
            db::AccountClass::Expense => Self::Expense,
            db::AccountClass::Cost => Self::Cost,
            db::AccountClass::Memo => Self::Memo,
        }
    }
}

impl From<AccountClass> for db::AccountClass {
    fn from(value: AccountClass) -> Self {
        match value {
            AccountClass::Asset => Self::Asset,
            AccountClass::Liability => Self::Liability,
            AccountClass::Equity => Self::Equity,
            AccountClass::Revenue => Self::Revenue,
            AccountClass::Expense => Self::Expense,
            AccountClass::Cost => Self::Cost,
            AccountClass::Memo => Self::Memo,
        }
    }
}

impl From<db::EntrySide> for Side {
    fn from(value: db::EntrySide) -> Self {
        match value {
            db::EntrySide::Debit => Self::Debit,
            db::EntrySide::Credit => Self::Credit,
        }
    }
}

impl From<Side> for db::EntrySide {
    fn from(value: Side) -> Self {
        match value {
            Side::Debit => Self::Debit,
            Side::Credit => Self::Credit,
        }
    }
}

impl From<db::EntryStatus> for EntryStatus {
    fn from(value: db::EntryStatus) -> Self {
        match value {
            db::EntryStatus::Draft => Self::Draft,
            db::EntryStatus::Pending => Self::Pending,
            db::EntryStatus::Approved => Self::Approved,
            db::EntryStatus::Posted => Self::Posted,
            db::EntryStatus::Voided => Self::Voided,
        }
    }
}

impl From<EntryStatus> for db::EntryStatus {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Draft => Self::Draft,
            EntryStatus::Pending => Self::Pending,
            EntryStatus::Approved => Self::Approved,
            EntryStatus::Posted => Self::Posted,
            EntryStatus::Voided => Self::Voided,
        }
    }
}

impl From<db::AdjustmentKind> for AdjustmentKind {
    fn from(value: db::AdjustmentKind) -> Self {
        match value {
            db::AdjustmentKind::Depreciation => Self::Depreciation,
            db::AdjustmentKind::Accrual => Self::Accrual,
            db::AdjustmentKind::Deferral => Self::Deferral,
            db::AdjustmentKind::Prepayment => Self::Prepayment,
            db::AdjustmentKind::Provision => Self::Provision,
            db::AdjustmentKind::Correction => Self::Correction,
            db::AdjustmentKind::Other => Self::Other,
        }
    }
}

impl From<AdjustmentKind> for db::AdjustmentKind {
    fn from(value: AdjustmentKind) -> Self {
        match value {
            AdjustmentKind::Depreciation => Self::Depreciation,
            AdjustmentKind::Accrual => Self::Accrual,
            AdjustmentKind::Deferral => Self::Deferral,
            AdjustmentKind::Prepayment => Self::Prepayment,
            AdjustmentKind::Provision => Self::Provision,
            AdjustmentKind::Correction => Self::Correction,
            AdjustmentKind::Other => Self::Other,
        }
    }
}

// ========== Rows ==========

fn timestamp(at: chrono::DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

fn utc(at: DateTimeWithTimeZone) -> chrono::DateTime<Utc> {
    at.with_timezone(&Utc)
}

/// Builds an account. `has_children` marks it as a parent even when the
/// row's own flag is unset.
pub fn account_from_model(model: accounts::Model, has_children: bool) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        class: model.class.into(),
        normal_side: model.normal_side.into(),
        parent_id: model.parent_id.map(AccountId::from_uuid),
        is_group: model.is_group || has_children,
    }
}

pub fn period_from_model(model: monthly_periods::Model) -> MonthlyPeriod {
    MonthlyPeriod {
        id: MonthlyPeriodId::from_uuid(model.id),
        fiscal_period_id: FiscalPeriodId::from_uuid(model.fiscal_period_id),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        is_closed: model.is_closed,
        closed_by: model.closed_by.map(UserId::from_uuid),
        closed_at: model.closed_at.map(utc),
        allow_out_of_range_dates: model.allow_out_of_range_dates,
        has_opening_balance: model.has_opening_balance,
        opening_entry_id: model.opening_entry_id.map(JournalEntryId::from_uuid),
    }
}

pub fn period_to_active(period: &MonthlyPeriod) -> monthly_periods::ActiveModel {
    monthly_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        fiscal_period_id: Set(period.fiscal_period_id.into_inner()),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        is_closed: Set(period.is_closed),
        closed_by: Set(period.closed_by.map(UserId::into_inner)),
        closed_at: Set(period.closed_at.map(timestamp)),
        allow_out_of_range_dates: Set(period.allow_out_of_range_dates),
        has_opening_balance: Set(period.has_opening_balance),
        opening_entry_id: Set(period.opening_entry_id.map(JournalEntryId::into_inner)),
    }
}

pub fn line_from_model(model: journal_entry_lines::Model) -> Result<JournalLine, StoreError> {
    let line_number = u32::try_from(model.line_number).map_err(|_| {
        StoreError::Backend(format!("invalid line number {} on line {}", model.line_number, model.id))
    })?;
    Ok(JournalLine {
        id: JournalLineId::from_uuid(model.id),
        line_number,
        account_id: AccountId::from_uuid(model.account_id),
        side: model.side.into(),
        amount: Amount::from(model.amount),
        description: model.description,
    })
}

pub fn line_to_active(
    entry_id: JournalEntryId,
    line: &JournalLine,
) -> Result<journal_entry_lines::ActiveModel, StoreError> {
    let line_number = i32::try_from(line.line_number).map_err(|_| {
        StoreError::Backend(format!("line number {} out of range on line {}", line.line_number, line.id))
    })?;
    Ok(journal_entry_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        journal_entry_id: Set(entry_id.into_inner()),
        line_number: Set(line_number),
        account_id: Set(line.account_id.into_inner()),
        side: Set(line.side.into()),
        amount: Set(line.amount.as_decimal()),
        description: Set(line.description.clone()),
    })
}

pub fn entry_from_model(
    model: journal_entries::Model,
    lines: Vec<journal_entry_lines::Model>,
) -> Result<JournalEntry, StoreError> {
    let entry_number = u64::try_from(model.entry_number).map_err(|_| {
        StoreError::Backend(format!("invalid entry number {} on entry {}", model.entry_number, model.id))
    })?;
    let lines = lines
        .into_iter()
        .map(line_from_model)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        entry_number: EntryNumber::new(entry_number),
        entry_date: model.entry_date,
        description: model.description,
        reference: model.reference,
        monthly_period_id: MonthlyPeriodId::from_uuid(model.monthly_period_id),
        fiscal_period_id: FiscalPeriodId::from_uuid(model.fiscal_period_id),
        total_debit: Amount::from(model.total_debit),
        total_credit: Amount::from(model.total_credit),
        is_balanced: model.is_balanced,
        status: model.status.into(),
        adjustment: model.adjustment_kind.map(|kind| Adjustment {
            kind: kind.into(),
            adjusts_entry_id: model.adjusts_entry_id.map(JournalEntryId::from_uuid),
        }),
        is_opening: model.is_opening,
        notes: model.notes,
        created_by: UserId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
        updated_by: UserId::from_uuid(model.updated_by),
        updated_at: utc(model.updated_at),
        submitted_by: model.submitted_by.map(UserId::from_uuid),
        submitted_at: model.submitted_at.map(utc),
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_at: model.approved_at.map(utc),
        voided_by: model.voided_by.map(UserId::from_uuid),
        voided_at: model.voided_at.map(utc),
        void_reason: model.void_reason,
        lines,
    })
}

pub fn entry_to_active(entry: &JournalEntry) -> Result<journal_entries::ActiveModel, StoreError> {
    let entry_number = i64::try_from(entry.entry_number.value()).map_err(|_| {
        StoreError::Backend(format!("entry number {} out of range", entry.entry_number))
    })?;
    Ok(journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        entry_number: Set(entry_number),
        entry_date: Set(entry.entry_date),
        description: Set(entry.description.clone()),
        reference: Set(entry.reference.clone()),
        monthly_period_id: Set(entry.monthly_period_id.into_inner()),
        fiscal_period_id: Set(entry.fiscal_period_id.into_inner()),
        total_debit: Set(entry.total_debit.as_decimal()),
        total_credit: Set(entry.total_credit.as_decimal()),
        is_balanced: Set(entry.is_balanced),
        status: Set(entry.status.into()),
        adjustment_kind: Set(entry.adjustment.as_ref().map(|a| a.kind.into())),
        adjusts_entry_id: Set(entry
            .adjustment
            .as_ref()
            .and_then(|a| a.adjusts_entry_id)
            .map(JournalEntryId::into_inner)),
        is_opening: Set(entry.is_opening),
        notes: Set(entry.notes.clone()),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(timestamp(entry.created_at)),
        updated_by: Set(entry.updated_by.into_inner()),
        updated_at: Set(timestamp(entry.updated_at)),
        submitted_by: Set(entry.submitted_by.map(UserId::into_inner)),
        submitted_at: Set(entry.submitted_at.map(timestamp)),
        approved_by: Set(entry.approved_by.map(UserId::into_inner)),
        approved_at: Set(entry.approved_at.map(timestamp)),
        voided_by: Set(entry.voided_by.map(UserId::into_inner)),
        voided_at: Set(entry.voided_at.map(timestamp)),
        void_reason: Set(entry.void_reason.clone()),
    })
}
