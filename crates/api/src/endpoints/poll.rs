//! Poll endpoints.

use axum::{Router, extract::State, routing::post};
use ballot_common::{AppError, AppResult};
use ballot_db::entities::poll;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::ApiJson,
    response::ApiResponse,
    state::AppState,
    validate::required,
};

/// Poll payload.
#[derive(Debug, Serialize)]
pub struct PollPayload {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<poll::Model> for PollPayload {
    fn from(model: poll::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Open poll response.
#[derive(Debug, Serialize)]
pub struct PollData {
    pub poll: PollPayload,
}

/// Open poll request.
#[derive(Debug, Deserialize)]
pub struct OpenPollRequest {
    #[serde(default)]
    pub fields: Option<OpenPollFields>,
}

/// Open poll request fields.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct OpenPollFields {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
}

/// Open a poll by title, creating it on first use.
async fn open_poll(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OpenPollRequest>,
) -> AppResult<ApiResponse<PollData>> {
    let fields = required(req.fields, &["fields"])?;
    fields
        .validate()
        .map_err(|e| AppError::from(e).under("fields"))?;
    let title = required(fields.title, &["fields", "title"])?;

    let poll = state.poll_service.open_poll(&title).await?;

    Ok(ApiResponse::ok(PollData { poll: poll.into() }))
}

/// Show poll request.
#[derive(Debug, Deserialize, Validate)]
pub struct ShowPollRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub poll_id: Option<String>,
}

/// Get poll details.
async fn show_poll(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ShowPollRequest>,
) -> AppResult<ApiResponse<PollData>> {
    req.validate()?;
    let poll_id = required(req.poll_id, &["poll_id"])?;

    let poll = state.poll_service.get_poll(&poll_id).await?;

    Ok(ApiResponse::ok(PollData { poll: poll.into() }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/open", post(open_poll))
        .route("/show", post(show_poll))
}
