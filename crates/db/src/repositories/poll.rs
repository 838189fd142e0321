//! Poll repository.

use std::sync::Arc;

use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entities::{Poll, poll};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, poll_id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(poll_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning a not-found error if absent.
    pub async fn get_by_id(&self, poll_id: &str) -> AppResult<poll::Model> {
        self.find_by_id(poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound("poll".to_string()))
    }

    /// Find a poll by its title.
    pub async fn find_by_title(&self, title: &str) -> AppResult<Option<poll::Model>> {
        Poll::find()
            .filter(poll::Column::Title.eq(title))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all polls.
    pub async fn count(&self) -> AppResult<u64> {
        Poll::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
