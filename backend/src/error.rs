//! Errors surfaced by the group service and how they render over HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use santa_core::{GroupId, SantaError};
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] SantaError),
    #[error("group {0} not found")]
    NotFound(GroupId),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("caller identity required")]
    Unauthenticated,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Maps a store error, reporting a failed status precondition as `locked`.
    pub(crate) fn from_store(err: StoreError, locked: SantaError) -> Self {
        match err {
            StoreError::ConditionFailed => ServiceError::Core(locked),
            other => other.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Core(SantaError::NotAuthorized) => StatusCode::FORBIDDEN,
            ServiceError::Core(SantaError::AlreadyGenerated)
            | ServiceError::Core(SantaError::DrawAlreadyCompleted) => StatusCode::CONFLICT,
            ServiceError::Core(SantaError::InsufficientMembers { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Core(SantaError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Core(SantaError::NotAuthorized) => "NOT_AUTHORIZED",
            ServiceError::Core(SantaError::AlreadyGenerated) => "ALREADY_GENERATED",
            ServiceError::Core(SantaError::DrawAlreadyCompleted) => "DRAW_ALREADY_COMPLETED",
            ServiceError::Core(SantaError::InsufficientMembers { .. }) => "INSUFFICIENT_MEMBERS",
            ServiceError::Core(SantaError::InvalidInput { .. }) => "INVALID_INPUT",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ServiceError::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            StoreError::ConditionFailed => ServiceError::Core(SantaError::AlreadyGenerated),
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Serialize)]
struct ErrorDetails {
    code: &'static str,
    message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetails {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}
