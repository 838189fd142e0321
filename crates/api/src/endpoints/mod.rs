//! API endpoints.

use axum::Router;

use crate::state::AppState;

pub mod ping;
pub mod poll;
pub mod vote;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(ping::router())
        .nest("/poll", poll::router().merge(vote::router()))
}
