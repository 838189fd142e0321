//! Vote aggregation.
//!
//! Statistics are a replay of the append-only ledger: per voter, only
//! the most recent event counts; a tombstoned effective ballot counts
//! as "no vote". The reduction itself is a pure function so the
//! hardest logic is testable without storage.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ballot_common::{AppResult, VoteConfig};
use ballot_db::{
    entities::vote::{self, VoteType},
    repositories::VoteRepository,
};
use serde::Serialize;

/// Options for one statistics computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsOptions {
    /// Report `num_total` as the raw signed difference instead of
    /// clamping at 0.
    pub allow_negative_num_total_votes: bool,
}

impl From<&VoteConfig> for StatsOptions {
    fn from(config: &VoteConfig) -> Self {
        Self {
            allow_negative_num_total_votes: config.allow_negative_num_total_votes,
        }
    }
}

/// Aggregated statistics for one (poll, kind, code) partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub num_upvotes: i64,
    pub num_downvotes: i64,
    /// Net rating. The only stat that can go negative, and only when
    /// explicitly opted in.
    pub num_total: i64,
}

/// Reduce a partition's event log to one effective ballot per voter.
///
/// Voter identity is the composite (voter_id, voter_type). Within a
/// voter's events the row with the greatest `created_at` wins; ties
/// are broken by `id` (ULIDs, so id order approximates insertion
/// order). The winner is returned irrespective of its `undone_at` —
/// filtering tombstones is the caller's step.
#[must_use]
pub fn effective_ballots(votes: Vec<vote::Model>) -> Vec<vote::Model> {
    let mut latest: HashMap<(String, String), vote::Model> = HashMap::new();

    for vote in votes {
        let key = (vote.voter_id.clone(), vote.voter_type.clone());
        match latest.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(vote);
            }
            Entry::Occupied(mut slot) => {
                let held = slot.get();
                let newer = match vote.created_at.cmp(&held.created_at) {
                    Ordering::Greater => true,
                    Ordering::Equal => vote.id > held.id,
                    Ordering::Less => false,
                };
                if newer {
                    slot.insert(vote);
                }
            }
        }
    }

    latest.into_values().collect()
}

/// Tally a partition's event log into [`PollStats`].
#[must_use]
pub fn tally(votes: Vec<vote::Model>, options: StatsOptions) -> PollStats {
    let standing: Vec<_> = effective_ballots(votes)
        .into_iter()
        .filter(|ballot| ballot.undone_at.is_none())
        .collect();

    let num_upvotes = count_of(&standing, VoteType::Up);
    let num_downvotes = count_of(&standing, VoteType::Down);

    let actual_total = num_upvotes - num_downvotes;
    let num_total = if options.allow_negative_num_total_votes {
        actual_total
    } else {
        actual_total.max(0)
    };

    PollStats {
        num_upvotes,
        num_downvotes,
        num_total,
    }
}

fn count_of(ballots: &[vote::Model], vote_type: VoteType) -> i64 {
    ballots.iter().filter(|b| b.vote_type == vote_type).count() as i64
}

/// Reads a (poll, kind, code) partition and tallies it.
#[derive(Clone)]
pub struct VoteStatsService {
    vote_repo: VoteRepository,
    defaults: StatsOptions,
}

impl VoteStatsService {
    /// Create a new stats service with the given default options.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, defaults: StatsOptions) -> Self {
        Self { vote_repo, defaults }
    }

    /// Aggregate statistics for one partition using the service
    /// defaults. kind and code are exact-match filters: a mismatch on
    /// either yields zero counts.
    pub async fn stats_for_poll(
        &self,
        poll_id: &str,
        kind: &str,
        code: &str,
    ) -> AppResult<PollStats> {
        self.stats_for_poll_with(poll_id, kind, code, self.defaults)
            .await
    }

    /// Aggregate statistics for one partition with explicit options.
    pub async fn stats_for_poll_with(
        &self,
        poll_id: &str,
        kind: &str,
        code: &str,
        options: StatsOptions,
    ) -> AppResult<PollStats> {
        let votes = self.vote_repo.find_by_partition(poll_id, kind, code).await?;
        Ok(tally(votes, options))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    struct Ballot<'a> {
        id: &'a str,
        voter_id: &'a str,
        vote_type: VoteType,
        offset_secs: i64,
        undone: bool,
    }

    impl Default for Ballot<'_> {
        fn default() -> Self {
            Self {
                id: "b1",
                voter_id: "v1",
                vote_type: VoteType::Up,
                offset_secs: 0,
                undone: false,
            }
        }
    }

    fn vote_event(ballot: &Ballot<'_>) -> vote::Model {
        let base = Utc::now();
        vote::Model {
            id: ballot.id.to_string(),
            poll_id: "p1".to_string(),
            voter_id: ballot.voter_id.to_string(),
            voter_type: "sys/user".to_string(),
            vote_type: ballot.vote_type,
            kind: "red".to_string(),
            code: "mars".to_string(),
            created_at: (base + Duration::seconds(ballot.offset_secs)).into(),
            undone_at: ballot.undone.then(|| base.into()),
        }
    }

    #[test]
    fn test_effective_ballots_latest_wins() {
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                vote_type: VoteType::Up,
                offset_secs: 0,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                vote_type: VoteType::Down,
                offset_secs: 10,
                ..Ballot::default()
            }),
        ];

        let effective = effective_ballots(votes);

        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].id, "b2");
        assert_eq!(effective[0].vote_type, VoteType::Down);
    }

    #[test]
    fn test_effective_ballots_input_order_is_irrelevant() {
        let newer = vote_event(&Ballot {
            id: "b2",
            offset_secs: 10,
            ..Ballot::default()
        });
        let older = vote_event(&Ballot {
            id: "b1",
            offset_secs: 0,
            ..Ballot::default()
        });

        let effective = effective_ballots(vec![newer.clone(), older]);

        assert_eq!(effective, vec![newer]);
    }

    #[test]
    fn test_effective_ballots_tie_broken_by_id() {
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                vote_type: VoteType::Down,
                ..Ballot::default()
            }),
        ];
        // Same created_at for both
        let base = votes[0].created_at;
        let votes: Vec<_> = votes
            .into_iter()
            .map(|mut v| {
                v.created_at = base;
                v
            })
            .collect();

        let effective = effective_ballots(votes);

        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].id, "b2");
    }

    #[test]
    fn test_effective_ballots_one_per_voter() {
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                voter_id: "v1",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                voter_id: "v2",
                vote_type: VoteType::Down,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b3",
                voter_id: "v2",
                vote_type: VoteType::Up,
                offset_secs: 5,
                ..Ballot::default()
            }),
        ];

        let mut effective = effective_ballots(votes);
        effective.sort_by(|a, b| a.voter_id.cmp(&b.voter_id));

        assert_eq!(effective.len(), 2);
        assert_eq!(effective[0].id, "b1");
        assert_eq!(effective[1].id, "b3");
    }

    #[test]
    fn test_voter_identity_includes_voter_type() {
        let mut second = vote_event(&Ballot {
            id: "b2",
            vote_type: VoteType::Down,
            offset_secs: 5,
            ..Ballot::default()
        });
        second.voter_type = "sys/bot".to_string();

        let votes = vec![vote_event(&Ballot::default()), second];

        // Same voter_id, different voter_type: two distinct voters.
        assert_eq!(effective_ballots(votes).len(), 2);
    }

    #[test]
    fn test_tally_counts_effective_ballots() {
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                voter_id: "v1",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                voter_id: "v2",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b3",
                voter_id: "v3",
                vote_type: VoteType::Down,
                ..Ballot::default()
            }),
        ];

        let stats = tally(votes, StatsOptions::default());

        assert_eq!(
            stats,
            PollStats {
                num_upvotes: 2,
                num_downvotes: 1,
                num_total: 1,
            }
        );
    }

    #[test]
    fn test_tally_earlier_vote_contributes_nothing() {
        // Upvote then downvote: the voter counts as a downvoter only.
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                vote_type: VoteType::Up,
                offset_secs: 0,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                vote_type: VoteType::Down,
                offset_secs: 10,
                ..Ballot::default()
            }),
        ];

        let stats = tally(votes, StatsOptions::default());

        assert_eq!(stats.num_upvotes, 0);
        assert_eq!(stats.num_downvotes, 1);
        assert_eq!(stats.num_total, 0); // clamped
    }

    #[test]
    fn test_tally_undone_effective_ballot_is_no_vote() {
        let votes = vec![vote_event(&Ballot {
            undone: true,
            ..Ballot::default()
        })];

        let stats = tally(votes, StatsOptions::default());

        assert_eq!(
            stats,
            PollStats {
                num_upvotes: 0,
                num_downvotes: 0,
                num_total: 0,
            }
        );
    }

    #[test]
    fn test_tally_undone_earlier_vote_does_not_mask_current() {
        // An older tombstoned event must not hide a newer live one.
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                vote_type: VoteType::Up,
                offset_secs: 0,
                undone: true,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                vote_type: VoteType::Down,
                offset_secs: 10,
                ..Ballot::default()
            }),
        ];

        let stats = tally(votes, StatsOptions::default());

        assert_eq!(stats.num_downvotes, 1);
        assert_eq!(stats.num_upvotes, 0);
    }

    #[test]
    fn test_tally_clamps_negative_total_by_default() {
        let votes = vec![vote_event(&Ballot {
            vote_type: VoteType::Down,
            ..Ballot::default()
        })];

        let stats = tally(votes, StatsOptions::default());

        assert_eq!(stats.num_downvotes, 1);
        assert_eq!(stats.num_total, 0);
    }

    #[test]
    fn test_tally_negative_total_when_opted_in() {
        let votes = vec![vote_event(&Ballot {
            vote_type: VoteType::Down,
            ..Ballot::default()
        })];

        let stats = tally(
            votes,
            StatsOptions {
                allow_negative_num_total_votes: true,
            },
        );

        assert_eq!(stats.num_total, -1);
    }

    #[test]
    fn test_tally_empty_partition() {
        let stats = tally(vec![], StatsOptions::default());

        assert_eq!(
            stats,
            PollStats {
                num_upvotes: 0,
                num_downvotes: 0,
                num_total: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_stats_service_reads_partition_and_tallies() {
        let votes = vec![
            vote_event(&Ballot {
                id: "b1",
                voter_id: "v1",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
            vote_event(&Ballot {
                id: "b2",
                voter_id: "v2",
                vote_type: VoteType::Up,
                ..Ballot::default()
            }),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([votes])
            .into_connection();

        let service = VoteStatsService::new(
            VoteRepository::new(Arc::new(db)),
            StatsOptions::default(),
        );

        let stats = service.stats_for_poll("p1", "red", "mars").await.unwrap();

        assert_eq!(
            stats,
            PollStats {
                num_upvotes: 2,
                num_downvotes: 0,
                num_total: 2,
            }
        );
    }
}
