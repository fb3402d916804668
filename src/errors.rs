use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// The single error type every handler and repository method resolves to.
/// Each variant maps to exactly one HTTP status; the response body always
/// carries the `{error: true, message}` shape the frontend consumes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid bearer token.
    #[error("Unauthorized access")]
    Unauthorized,
    /// Authenticated but lacking the required role (or claims).
    #[error("forbidden access")]
    Forbidden,
    /// Malformed identifier or missing required payload.
    #[error("{0}")]
    BadRequest(String),
    /// Store unreachable or a driver operation failed.
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ErrorBody
///
/// Wire shape of every failed request: a flag plus a human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The underlying driver detail stays in the logs; clients only see
        // the generic message.
        if let ApiError::Internal(detail) = &self {
            tracing::error!("store operation failed: {detail}");
        }

        let body = Json(ErrorBody {
            error: true,
            message: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

// Driver and (de)serialization failures all surface as 500s, matching the
// reference behavior of passing store errors straight through.

impl From<mongodb::error::Error> for ApiError {
    fn from(e: mongodb::error::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ApiError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<mongodb::bson::de::Error> for ApiError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}
