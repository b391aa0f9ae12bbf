use crate::errors::{ApiError, ServiceError};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// Header carrying the active branch
pub const BRANCH_HEADER: &str = "x-branch-id";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Active branch taken from the `x-branch-id` header.
///
/// A missing or empty header yields `None`; a value that is not a UUID is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveBranch(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for ActiveBranch
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(BRANCH_HEADER) else {
            return Ok(Self(None));
        };

        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", BRANCH_HEADER)))?
            .trim();
        if raw.is_empty() {
            return Ok(Self(None));
        }

        Uuid::parse_str(raw)
            .map(|id| Self(Some(id)))
            .map_err(|_| ApiError::BadRequest(format!("{} must be a UUID", BRANCH_HEADER)))
    }
}
