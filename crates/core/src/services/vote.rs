//! Vote ledger service.
//!
//! The ledger is append-only: casting inserts a new event row and
//! undoing tombstones a group's most recent event. Nothing here ever
//! searches for or rewrites older history; which row "counts" is
//! resolved at aggregation time by latest-row-wins.

use ballot_common::{AppResult, IdGenerator};
use ballot_db::{
    entities::vote::{self, VoteType},
    repositories::{PollRepository, VoteGroup, VoteRepository},
};
use chrono::Utc;
use sea_orm::Set;

/// Input for casting one ballot.
#[derive(Debug, Clone)]
pub struct CastVoteInput {
    pub poll_id: String,
    pub voter_id: String,
    pub voter_type: String,
    pub vote_type: VoteType,
    pub kind: String,
    pub code: String,
}

/// Append-only vote ledger.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(vote_repo: VoteRepository, poll_repo: PollRepository) -> Self {
        Self {
            vote_repo,
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append a new vote event.
    ///
    /// The referenced poll must exist; otherwise this fails with
    /// not-found and writes nothing. A voter's earlier events on the
    /// same (poll, kind, code) are left untouched.
    pub async fn cast_vote(&self, input: CastVoteInput) -> AppResult<()> {
        self.poll_repo.get_by_id(&input.poll_id).await?;

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(input.poll_id),
            voter_id: Set(input.voter_id),
            voter_type: Set(input.voter_type),
            vote_type: Set(input.vote_type),
            kind: Set(input.kind),
            code: Set(input.code),
            created_at: Set(Utc::now().into()),
            undone_at: Set(None),
        };

        self.vote_repo.create(model).await?;
        Ok(())
    }

    /// Void the group's current ballot.
    ///
    /// Targets only the group's most recent event, irrespective of its
    /// `undone_at`. Undoing with no prior vote, or when the current
    /// event is already undone, succeeds with no effect.
    pub async fn undo_vote(&self, group: &VoteGroup) -> AppResult<()> {
        let Some(current) = self.vote_repo.find_current(group).await? else {
            return Ok(());
        };

        if current.undone_at.is_some() {
            return Ok(());
        }

        let mut active: vote::ActiveModel = current.into();
        active.undone_at = Set(Some(Utc::now().into()));
        self.vote_repo.update(active).await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ballot_common::AppError;
    use ballot_db::entities::poll;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_poll(id: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: "Q1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
            rating: None,
        }
    }

    fn test_vote(id: &str, vote_type: VoteType, undone: bool) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            poll_id: "p1".to_string(),
            voter_id: "v1".to_string(),
            voter_type: "sys/user".to_string(),
            vote_type,
            kind: "red".to_string(),
            code: "mars".to_string(),
            created_at: Utc::now().into(),
            undone_at: undone.then(|| Utc::now().into()),
        }
    }

    fn group() -> VoteGroup {
        VoteGroup {
            poll_id: "p1".to_string(),
            voter_id: "v1".to_string(),
            voter_type: "sys/user".to_string(),
            kind: "red".to_string(),
            code: "mars".to_string(),
        }
    }

    fn input(vote_type: VoteType) -> CastVoteInput {
        CastVoteInput {
            poll_id: "p1".to_string(),
            voter_id: "v1".to_string(),
            voter_type: "sys/user".to_string(),
            vote_type,
            kind: "red".to_string(),
            code: "mars".to_string(),
        }
    }

    fn services(db: sea_orm::DatabaseConnection) -> VoteService {
        let db = Arc::new(db);
        VoteService::new(
            VoteRepository::new(Arc::clone(&db)),
            PollRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_cast_vote_inserts_new_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_poll("p1")]])
            .append_query_results([[test_vote("vt1", VoteType::Up, false)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        services(db).cast_vote(input(VoteType::Up)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cast_vote_on_missing_poll_writes_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<poll::Model>::new()])
            .into_connection();

        let service = services(db);
        let result = service.cast_vote(input(VoteType::Down)).await;

        match result {
            Err(AppError::NotFound(what)) => assert_eq!(what, "poll"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undo_without_prior_vote_is_inert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<vote::Model>::new()])
            .into_connection();

        services(db).undo_vote(&group()).await.unwrap();
    }

    #[tokio::test]
    async fn test_undo_tombstones_current_vote() {
        let current = test_vote("vt1", VoteType::Up, false);
        let tombstoned = test_vote("vt1", VoteType::Up, true);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_query_results([[tombstoned]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        services(db).undo_vote(&group()).await.unwrap();
    }

    #[tokio::test]
    async fn test_undo_is_idempotent_on_already_undone_vote() {
        // The mock has no exec results queued: the test fails if the
        // service tries to run an UPDATE.
        let already_undone = test_vote("vt1", VoteType::Up, true);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[already_undone]])
            .into_connection();

        services(db).undo_vote(&group()).await.unwrap();
    }
}
