//! Core business logic for ballot-rs.

pub mod services;

pub use services::*;
