//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.
//! Codes are stable; messages never carry internal detail.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filevault_shared::{AuthError, ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::{debug, error};

/// Message for any JSON body the extractor could not read
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflicting headers detected")]
    HeaderConflict,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// HTTP status and stable error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::HeaderConflict => (StatusCode::BAD_REQUEST, "HEADER_CONFLICT"),
            ApiError::Auth(AuthError::MissingToken) => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            ApiError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            ApiError::Auth(AuthError::InvalidToken) => (StatusCode::FORBIDDEN, "INVALID_TOKEN"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        }
    }

    /// Validation error for a JSON body axum rejected
    ///
    /// Syntax errors, wrong field types and a missing content type all
    /// collapse to one 400. The parser detail only goes to the log.
    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        debug!(
            status = %rejection.status(),
            reason = %rejection.body_text(),
            "Rejected JSON body"
        );
        ApiError::Validation(INVALID_BODY_MESSAGE.to_string())
    }

    /// Message safe to show to the caller
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::HeaderConflict => "Conflicting headers detected".to_string(),
            ApiError::Auth(err) => err.to_string(),
            ApiError::TooManyRequests => {
                "Too many requests from this IP, please try again later.".to_string()
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "An internal error occurred".to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                "A database error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.public_message();

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
