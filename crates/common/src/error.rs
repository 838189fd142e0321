//! Error types for ballot-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// A request field is missing or malformed. Carries the field path
    /// and a short machine-readable reason tag ("required", "only",
    /// "length", "base").
    #[error("invalid field {}: {why_exactly}", path.join("."))]
    Validation {
        /// Path of the offending field, outermost segment first.
        path: Vec<String>,
        /// Short reason tag, stable across releases.
        why_exactly: String,
    },

    /// A referenced entity does not exist. Carries the entity label
    /// exposed to clients as `details.what`.
    #[error("not found: {0}")]
    NotFound(String),

    // === Server Errors ===
    #[error("database error: {0}")]
    Database(String),

    #[error("lock error: {0}")]
    Lock(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure at the given path.
    pub fn invalid_field<P, S>(path: P, why_exactly: &str) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            path: path.into_iter().map(Into::into).collect(),
            why_exactly: why_exactly.to_string(),
        }
    }

    /// Prepend a path segment to a validation error, leaving other
    /// variants untouched. Used when surfacing nested-field failures.
    #[must_use]
    pub fn under(self, segment: &str) -> Self {
        match self {
            Self::Validation { mut path, why_exactly } => {
                path.insert(0, segment.to_string());
                Self::Validation { path, why_exactly }
            }
            other => other,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 5xx Server Errors
            Self::Database(_) | Self::Lock(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the stable reason code exposed as `why` in failure
    /// envelopes.
    #[must_use]
    pub const fn why(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid-field",
            Self::NotFound(_) => "not-found",
            Self::Database(_) | Self::Lock(_) | Self::Config(_) | Self::Internal(_) => "internal",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let why = self.why();

        if self.is_server_error() {
            tracing::error!(error = %self, why = why, "Server error occurred");
        } else {
            tracing::debug!(error = %self, why = why, "Client error occurred");
        }

        // Infrastructure errors fail generically: no raw error text on
        // the wire, only the envelope.
        let body = match &self {
            Self::Validation { path, why_exactly } => Json(json!({
                "ok": false,
                "why": why,
                "details": { "path": path, "why_exactly": why_exactly },
            })),
            Self::NotFound(what) => Json(json!({
                "ok": false,
                "why": why,
                "details": { "what": what },
            })),
            _ => Json(json!({ "ok": false, "why": why })),
        };

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Surface a single offending field, the way the wire contract
        // reports one path per failure. Fields are sorted so the pick
        // is deterministic.
        let mut fields: Vec<(String, String)> = err
            .field_errors()
            .iter()
            .filter_map(|(name, errs)| {
                errs.first().map(|e| (name.to_string(), e.code.to_string()))
            })
            .collect();
        fields.sort();

        fields.into_iter().next().map_or_else(
            || Self::invalid_field(Vec::<String>::new(), "base"),
            |(name, code)| Self::invalid_field([name], &code),
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
