//! Poll registry service.

use std::sync::Arc;

use ballot_common::{AppResult, IdGenerator};
use ballot_db::{entities::poll, repositories::PollRepository};
use chrono::Utc;
use sea_orm::Set;

use crate::services::lock::{Locker, with_lock};

/// Idempotent open-or-fetch poll creation, keyed by title.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    locker: Arc<dyn Locker>,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub fn new(poll_repo: PollRepository, locker: Arc<dyn Locker>) -> Self {
        Self {
            poll_repo,
            locker,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a poll by title, creating it on first use.
    ///
    /// The whole check-then-act runs inside the gate: concurrent
    /// callers with the same title converge on exactly one persisted
    /// poll. An existing poll is returned unchanged; `updated_at` is
    /// not bumped.
    pub async fn open_poll(&self, title: &str) -> AppResult<poll::Model> {
        with_lock(self.locker.as_ref(), || async {
            if let Some(existing) = self.poll_repo.find_by_title(title).await? {
                return Ok(existing);
            }

            let model = poll::ActiveModel {
                id: Set(self.id_gen.generate()),
                title: Set(title.to_string()),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                rating: Set(None),
            };

            let created = self.poll_repo.create(model).await?;

            // Read the row back so store-assigned fields are in their
            // persisted form.
            self.poll_repo.get_by_id(&created.id).await
        })
        .await
    }

    /// Get a poll by ID.
    pub async fn get_poll(&self, poll_id: &str) -> AppResult<poll::Model> {
        self.poll_repo.get_by_id(poll_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::lock::NoopLocker;
    use ballot_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_poll(id: &str, title: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: title.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
            rating: None,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> PollService {
        PollService::new(PollRepository::new(Arc::new(db)), Arc::new(NoopLocker))
    }

    #[tokio::test]
    async fn test_open_poll_returns_existing_poll_unchanged() {
        let existing = test_poll("p1", "Best hairline of the Ist century A.D.");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .into_connection();

        let found = service(db)
            .open_poll("Best hairline of the Ist century A.D.")
            .await
            .unwrap();

        assert_eq!(found, existing);
    }

    #[tokio::test]
    async fn test_open_poll_creates_when_title_is_new() {
        let created = test_poll("p2", "Favorite Roman civil war");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // title lookup finds nothing
            .append_query_results([Vec::<poll::Model>::new()])
            // insert returning, then the normalizing re-read
            .append_query_results([[created.clone()], [created.clone()]])
            .append_exec_results([sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let opened = service(db).open_poll("Favorite Roman civil war").await.unwrap();

        assert_eq!(opened.id, "p2");
        assert_eq!(opened.title, "Favorite Roman civil war");
        assert!(opened.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_get_poll_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<poll::Model>::new()])
            .into_connection();

        let result = service(db).get_poll("missing").await;

        match result {
            Err(AppError::NotFound(what)) => assert_eq!(what, "poll"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_poll_found() {
        let poll = test_poll("p1", "Q1");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll.clone()]])
            .into_connection();

        let found = service(db).get_poll("p1").await.unwrap();
        assert_eq!(found, poll);
    }
}
