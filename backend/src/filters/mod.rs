//! Global request filter pipeline
//!
//! Cross-cutting checks and transforms that run before routing. Each stage
//! implements [`RequestFilter`]; a [`FilterPipeline`] runs the request
//! stages in order, short-circuits on the first rejection, and then lets
//! every stage touch the outgoing response (in reverse order).

use crate::config::SecurityConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

mod header_conflict;
mod parameter_pollution;
mod rate_limit;
mod security_headers;

pub use header_conflict::HeaderConflictFilter;
pub use parameter_pollution::ParameterPollutionFilter;
pub use rate_limit::RateLimitFilter;
pub use security_headers::SecurityHeadersFilter;

/// One stage of the global pipeline
#[async_trait]
pub trait RequestFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspect or rewrite the request; an error rejects it
    async fn on_request(&self, _request: &mut Request) -> Result<(), ApiError> {
        Ok(())
    }

    /// Adjust the outgoing response
    fn on_response(&self, _response: &mut Response) {}
}

/// Ordered set of filters applied to every request
#[derive(Clone, Default)]
pub struct FilterPipeline {
    stages: Vec<Arc<dyn RequestFilter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn with<F: RequestFilter + 'static>(mut self, filter: F) -> Self {
        self.stages.push(Arc::new(filter));
        self
    }

    /// The standard stage order: header conflict check, parameter pollution
    /// cleanup, per-IP rate limit, security response headers.
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new()
            .with(HeaderConflictFilter)
            .with(ParameterPollutionFilter)
            .with(RateLimitFilter::new(
                config.rate_limit_max_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            ))
            .with(SecurityHeadersFilter)
    }

    /// Run the pipeline around `next`
    pub async fn run(&self, mut request: Request, next: Next) -> Response {
        let mut response = 'handled: {
            for stage in &self.stages {
                if let Err(e) = stage.on_request(&mut request).await {
                    debug!(filter = stage.name(), error = %e, "Request rejected by filter");
                    break 'handled e.into_response();
                }
            }
            next.run(request).await
        };

        for stage in self.stages.iter().rev() {
            stage.on_response(&mut response);
        }
        response
    }
}

/// Middleware entry point, mounted with `from_fn_with_state`
pub async fn apply_filters(
    State(pipeline): State<FilterPipeline>,
    request: Request,
    next: Next,
) -> Response {
    pipeline.run(request, next).await
}
