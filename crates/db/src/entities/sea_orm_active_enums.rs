//! Postgres enum types used by the ledger tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `account_class` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_class")]
pub enum AccountClass {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "cost")]
    Cost,
    #[sea_orm(string_value = "memo")]
    Memo,
}

/// `entry_side` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_side")]
pub enum EntrySide {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

/// `entry_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "voided")]
    Voided,
}

/// `adjustment_kind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "adjustment_kind")]
pub enum AdjustmentKind {
    #[sea_orm(string_value = "depreciation")]
    Depreciation,
    #[sea_orm(string_value = "accrual")]
    Accrual,
    #[sea_orm(string_value = "deferral")]
    Deferral,
    #[sea_orm(string_value = "prepayment")]
    Prepayment,
    #[sea_orm(string_value = "provision")]
    Provision,
    #[sea_orm(string_value = "correction")]
    Correction,
    #[sea_orm(string_value = "other")]
    Other,
}
