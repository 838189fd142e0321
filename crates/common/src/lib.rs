//! Common utilities and shared types for ballot-rs.
//!
//! This crate provides foundational components used across all
//! ballot-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`], including
//!   the eagerly-validated rating denormalization routing table
//! - **Error handling**: Unified error types via [`AppError`] and
//!   [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via
//!   [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use ballot_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, DependentsConfig, LockConfig, TotalTarget, VoteConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
