//! Collapses repeated query parameters to their last value so handlers
//! never see an unexpected list where they expect a scalar.

use super::RequestFilter;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::uri::{PathAndQuery, Uri},
};

pub struct ParameterPollutionFilter;

/// Keep the last value of every key, in order of first appearance
pub fn dedupe_query(query: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let key = pair.split_once('=').map_or(pair, |(k, _)| k);
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = pair,
            None => pairs.push((key, pair)),
        }
    }
    pairs
        .into_iter()
        .map(|(_, pair)| pair)
        .collect::<Vec<_>>()
        .join("&")
}

fn rewrite_query(uri: &Uri, query: &str) -> Option<Uri> {
    let path_and_query = format!("{}?{}", uri.path(), query);
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

#[async_trait]
impl RequestFilter for ParameterPollutionFilter {
    fn name(&self) -> &'static str {
        "parameter_pollution"
    }

    async fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
        let Some(query) = request.uri().query() else {
            return Ok(());
        };

        let deduped = dedupe_query(query);
        if deduped != query {
            if let Some(uri) = rewrite_query(request.uri(), &deduped) {
                *request.uri_mut() = uri;
            }
        }
        Ok(())
    }
}
