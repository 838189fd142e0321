//! Database repositories.

pub mod dependent;
pub mod poll;
pub mod vote;

pub use dependent::DependentRepository;
pub use poll::PollRepository;
pub use vote::{VoteGroup, VoteRepository};
