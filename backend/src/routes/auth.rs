//! Authentication routes
//!
//! Registration and login. Both are public and return the user together
//! with a freshly issued token.
//!
//! # Performance
//!
//! Password hashing and verification run on the blocking thread pool.

use crate::error::{ApiError, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use filevault_shared::{AuthError, AuthResponse, LoginRequest, RegisterRequest};
use tracing::debug;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Register a new user
///
/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = body.map_err(ApiError::from_json_rejection)?;
    let response = UserService::register(state.db(), state.jwt(), state.passwords(), &req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// POST /auth/login
///
/// An unreadable body is a failed login like any other.
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = body.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Rejected login body");
        ApiError::Auth(AuthError::InvalidCredentials)
    })?;
    let response = UserService::login(state.db(), state.jwt(), state.passwords(), &req).await?;
    Ok(Json(response))
}
