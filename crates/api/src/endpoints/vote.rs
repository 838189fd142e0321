//! Vote endpoints.

use std::collections::BTreeMap;

use axum::{Router, extract::State, routing::post};
use ballot_common::{AppError, AppResult};
use ballot_core::{CastVoteInput, PollStats};
use ballot_db::{entities::vote::VoteType, repositories::VoteGroup};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::ApiJson,
    response::ApiResponse,
    state::AppState,
    validate::{VOTER_TYPE_USER, check_dependents, one_of, required},
};

/// Vote statistics payload.
#[derive(Debug, Serialize)]
pub struct PollStatsData {
    pub poll_stats: PollStats,
}

/// What the `vote` request field asks for: cast a ballot, or void the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoteChoice {
    Cast(VoteType),
    Undo,
}

impl VoteChoice {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Cast(VoteType::Up)),
            "down" => Some(Self::Cast(VoteType::Down)),
            "undo" => Some(Self::Undo),
            _ => None,
        }
    }
}

/// Cast vote request.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    #[serde(default)]
    pub vote: Option<String>,
    #[serde(default)]
    pub fields: Option<VoteFields>,
    #[serde(default)]
    pub dependents: Option<BTreeMap<String, String>>,
}

/// Cast vote request fields.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct VoteFields {
    #[validate(length(min = 1, max = 64))]
    pub poll_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub voter_id: Option<String>,
    pub voter_type: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub kind: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
}

/// Cast or undo a vote, then report the partition's statistics. When
/// `dependents` is present, the clamped `num_total` is also copied
/// onto the routed entities.
async fn cast_vote(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CastVoteRequest>,
) -> AppResult<ApiResponse<PollStatsData>> {
    let vote = required(req.vote, &["vote"])?;
    let choice =
        VoteChoice::parse(&vote).ok_or_else(|| AppError::invalid_field(["vote"], "only"))?;

    let fields = required(req.fields, &["fields"])?;
    fields
        .validate()
        .map_err(|e| AppError::from(e).under("fields"))?;

    let poll_id = required(fields.poll_id, &["fields", "poll_id"])?;
    let voter_id = required(fields.voter_id, &["fields", "voter_id"])?;
    let voter_type = required(fields.voter_type, &["fields", "voter_type"])?;
    one_of(&voter_type, &[VOTER_TYPE_USER], &["fields", "voter_type"])?;
    let kind = required(fields.kind, &["fields", "kind"])?;
    let code = required(fields.code, &["fields", "code"])?;

    if let Some(ref dependents) = req.dependents {
        check_dependents(dependents)?;
    }

    match choice {
        VoteChoice::Cast(vote_type) => {
            state
                .vote_service
                .cast_vote(CastVoteInput {
                    poll_id: poll_id.clone(),
                    voter_id,
                    voter_type,
                    vote_type,
                    kind: kind.clone(),
                    code: code.clone(),
                })
                .await?;
        }
        VoteChoice::Undo => {
            state
                .vote_service
                .undo_vote(&VoteGroup {
                    poll_id: poll_id.clone(),
                    voter_id,
                    voter_type,
                    kind: kind.clone(),
                    code: code.clone(),
                })
                .await?;
        }
    }

    let poll_stats = state
        .stats_service
        .stats_for_poll(&poll_id, &kind, &code)
        .await?;

    if let Some(ref dependents) = req.dependents {
        state
            .rating_service
            .denormalize(poll_stats.num_total, dependents, &kind, &code)
            .await?;
    }

    Ok(ApiResponse::ok(PollStatsData { poll_stats }))
}

/// Read-only stats request.
#[derive(Debug, Deserialize, Validate)]
pub struct PollStatsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub poll_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub kind: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
}

/// Aggregate a partition without casting anything.
async fn poll_stats(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PollStatsRequest>,
) -> AppResult<ApiResponse<PollStatsData>> {
    req.validate()?;
    let poll_id = required(req.poll_id, &["poll_id"])?;
    let kind = required(req.kind, &["kind"])?;
    let code = required(req.code, &["code"])?;

    let poll_stats = state
        .stats_service
        .stats_for_poll(&poll_id, &kind, &code)
        .await?;

    Ok(ApiResponse::ok(PollStatsData { poll_stats }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vote", post(cast_vote))
        .route("/stats", post(poll_stats))
}
