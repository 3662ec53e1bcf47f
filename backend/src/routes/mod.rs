//! Route definitions for the FileVault API
//!
//! This module organizes all API routes and applies middleware.
//!
//! Layer order, outermost first: tracing, request id, global filter
//! pipeline, CORS, timeout, compression. Protected routes additionally run
//! the authentication gate and then their authorization policy.

use crate::config::SecurityConfig;
use crate::filters::{apply_filters, FilterPipeline};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use filevault_shared::MessageResponse;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

mod auth;
mod health;
mod users;


pub use auth::auth_routes;
pub use users::user_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let pipeline = FilterPipeline::from_config(&state.config().security);
    let cors = cors_layer(&state.config().security);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/auth", auth::auth_routes())
        .nest("/users", users::user_routes(state.clone()))
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(middleware::from_fn_with_state(pipeline, apply_filters))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured browser origins
fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "API working correctly!".to_string(),
    })
}
