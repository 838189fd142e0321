//! Liveness endpoint.

use axum::{Router, routing::get};
use serde::Serialize;

use crate::{response::ApiResponse, state::AppState};

/// Ping response.
#[derive(Debug, Serialize)]
pub struct PingData {
    pub message: &'static str,
}

async fn ping() -> ApiResponse<PingData> {
    ApiResponse::ok(PingData { message: "pong" })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}
