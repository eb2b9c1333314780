//! `SeaORM` Entity for entry_counters table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Counter row issuing journal entry numbers.
pub const JOURNAL_ENTRY_COUNTER: &str = "journal_entry";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
