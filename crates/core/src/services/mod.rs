//! Business logic services.

#![allow(missing_docs)]

pub mod lock;
pub mod poll;
pub mod rating;
pub mod vote;
pub mod vote_stats;

pub use lock::{FileLocker, Locker, NoopLocker, locker_from_config, with_lock};
pub use poll::PollService;
pub use rating::RatingService;
pub use vote::{CastVoteInput, VoteService};
pub use vote_stats::{PollStats, StatsOptions, VoteStatsService, effective_ballots, tally};
