//! Poll entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Poll title. Uniqueness is enforced cooperatively by the
    /// poll-creation gate, not by a storage-level constraint.
    #[sea_orm(indexed)]
    pub title: String,

    pub created_at: DateTimeWithTimeZone,

    /// Unused by mutation logic; polls are read-mostly after creation.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,

    /// Denormalized net rating, written only by the rating
    /// denormalizer when a routing table targets the poll itself.
    #[sea_orm(nullable)]
    pub rating: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
