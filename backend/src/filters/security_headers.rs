//! Hardening headers added to every response.

use super::RequestFilter;
use async_trait::async_trait;
use axum::{
    http::{HeaderName, HeaderValue},
    response::Response,
};

const HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
];

pub struct SecurityHeadersFilter;

#[async_trait]
impl RequestFilter for SecurityHeadersFilter {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn on_response(&self, response: &mut Response) {
        let headers = response.headers_mut();
        for &(name, value) in HEADERS {
            headers
                .entry(HeaderName::from_static(name))
                .or_insert_with(|| HeaderValue::from_static(value));
        }
        headers.remove("x-powered-by");
    }
}
