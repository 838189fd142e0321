//! HTTP API for ballot-rs.
//!
//! Request/response envelope convention: `{ok: true, data}` on
//! success, `{ok: false, why, details?}` on failure, with `why` one of
//! `invalid-field` or `not-found` for client errors.

pub mod endpoints;
pub mod extractors;
pub mod response;
pub mod state;
pub mod validate;

pub use endpoints::router;
pub use response::ApiResponse;
pub use state::AppState;
