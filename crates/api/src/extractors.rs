//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use ballot_common::AppError;
use serde::de::DeserializeOwned;

/// JSON body extractor that reports malformed bodies in the failure
/// envelope (`why: "invalid-field"`, reason `"base"`) instead of
/// axum's default rejection text.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Malformed request body");
                Err(AppError::invalid_field(Vec::<String>::new(), "base"))
            }
        }
    }
}
