//! services/api/src/web/response.rs
//!
//! The JSON error envelope shared by every handler: `{ "success": false, "error": "..." }`.

use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use submission_core::ports::PortError;
use tracing::error;
use utoipa::ToSchema;

use crate::storage::{CompletionError, StagingError};

/// Body of every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Errors a handler can return, each mapped to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<PortError> for HandlerError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(msg) => HandlerError::NotFound(msg),
            PortError::Unexpected(msg) => HandlerError::Internal(msg),
        }
    }
}

impl From<StagingError> for HandlerError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::TooLarge { .. } => HandlerError::PayloadTooLarge(e.to_string()),
            StagingError::Io(_) => HandlerError::Internal(e.to_string()),
        }
    }
}

impl From<CompletionError> for HandlerError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::MissingFolder(_) => HandlerError::NotFound(e.to_string()),
            CompletionError::Port(port) => port.into(),
            CompletionError::Io(_) | CompletionError::Serialize(_) => {
                HandlerError::Internal(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        HandlerError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for HandlerError {
    fn from(rejection: JsonRejection) -> Self {
        HandlerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for HandlerError {
    fn from(rejection: QueryRejection) -> Self {
        HandlerError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for HandlerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HandlerError::PayloadTooLarge(e.body_text())
        } else {
            HandlerError::BadRequest(e.body_text())
        }
    }
}

/// Returns `value` trimmed, or a 400 naming `field` when it is missing or blank.
pub fn required(value: Option<String>, field: &str) -> Result<String, HandlerError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerError::BadRequest(format!("{} is required", field)))
}
