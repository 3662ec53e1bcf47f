//! Rejects requests carrying both `Content-Length` and `Transfer-Encoding`,
//! the classic request smuggling ambiguity.

use super::RequestFilter;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::header::{CONTENT_LENGTH, TRANSFER_ENCODING},
};

pub struct HeaderConflictFilter;

#[async_trait]
impl RequestFilter for HeaderConflictFilter {
    fn name(&self) -> &'static str {
        "header_conflict"
    }

    async fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
        let headers = request.headers();
        if headers.contains_key(CONTENT_LENGTH) && headers.contains_key(TRANSFER_ENCODING) {
            return Err(ApiError::HeaderConflict);
        }
        Ok(())
    }
}
