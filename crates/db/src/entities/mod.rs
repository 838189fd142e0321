//! Database entities.

pub mod poll;
pub mod vote;

pub use poll::Entity as Poll;
pub use vote::Entity as Vote;
