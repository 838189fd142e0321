//! Vote ledger entity.
//!
//! The vote table is append-only and event-sourced: a new vote by the
//! same voter on the same (poll, kind, code) partition is inserted as a
//! new row, never an update. `undone_at` is the only field mutated
//! after creation, and only on a group's most recent row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ballot direction. A closed sum type, stored as a string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    #[sea_orm(string_value = "up")]
    Up,
    #[sea_orm(string_value = "down")]
    Down,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub poll_id: String,

    #[sea_orm(indexed)]
    pub voter_id: String,

    /// Capability tag identifying the kind of voting principal
    /// (currently always `"sys/user"`).
    pub voter_type: String,

    #[sea_orm(column_name = "type")]
    pub vote_type: VoteType,

    /// First partition key: one poll can host multiple independent
    /// voting dimensions.
    pub kind: String,

    /// Second partition key, scoped under `kind`.
    pub code: String,

    /// Doubles as the event's logical sequence number.
    pub created_at: DateTimeWithTimeZone,

    /// Non-null marks the event as voided (tombstoned).
    #[sea_orm(nullable)]
    pub undone_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::poll::Entity",
        from = "Column::PollId",
        to = "super::poll::Column::Id",
        on_delete = "Cascade"
    )]
    Poll,
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
