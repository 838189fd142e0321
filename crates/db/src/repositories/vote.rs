//! Vote ledger repository.

use std::sync::Arc;

use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{Vote, vote};

/// Identity of one logical election: a voter scoped to a (poll, kind,
/// code) partition. The ledger holds at most one *effective* ballot per
/// group at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteGroup {
    pub poll_id: String,
    pub voter_id: String,
    pub voter_type: String,
    pub kind: String,
    pub code: String,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a new vote event.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All vote events in a (poll, kind, code) partition, tombstoned or
    /// not. kind and code are exact-match filters.
    pub async fn find_by_partition(
        &self,
        poll_id: &str,
        kind: &str,
        code: &str,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::Kind.eq(kind))
            .filter(vote::Column::Code.eq(code))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The most recent vote event for a group, irrespective of its
    /// `undone_at`. Ties on `created_at` are broken by `id`; ids are
    /// ULIDs, so id order approximates insertion order.
    pub async fn find_current(&self, group: &VoteGroup) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(&group.poll_id))
            .filter(vote::Column::VoterId.eq(&group.voter_id))
            .filter(vote::Column::VoterType.eq(&group.voter_type))
            .filter(vote::Column::Kind.eq(&group.kind))
            .filter(vote::Column::Code.eq(&group.code))
            .order_by_desc(vote::Column::CreatedAt)
            .order_by_desc(vote::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a mutated vote row. Only the tombstoning path uses this.
    pub async fn update(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
