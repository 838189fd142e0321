//! Application state.

#![allow(missing_docs)]

use ballot_core::{PollService, RatingService, VoteService, VoteStatsService};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub poll_service: PollService,
    pub vote_service: VoteService,
    pub stats_service: VoteStatsService,
    pub rating_service: RatingService,
}
