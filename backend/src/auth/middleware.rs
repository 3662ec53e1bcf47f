//! Authentication gate
//!
//! Extracts the bearer token from the `Authorization` header, verifies it,
//! and attaches the resulting [`Identity`] to the request extensions. Every
//! protected route mounts [`authenticate`] explicitly; handlers read the
//! identity through the [`Identity`] extractor.

use crate::auth::jwt::{Identity, JwtService};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use filevault_shared::AuthError;
use tracing::debug;

/// Pull the bearer token out of the request headers
///
/// A missing header, a scheme other than `Bearer`, or an empty token all
/// count as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Resolve the identity asserted by the request headers
pub fn identify(jwt: &JwtService, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = bearer_token(headers)?;
    jwt.verify(token)
}

/// Middleware that rejects unauthenticated requests
///
/// No token: 401 `MISSING_TOKEN`. Bad token: 403 `INVALID_TOKEN`.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identify(state.jwt(), request.headers()).map_err(|e| {
        debug!(path = %request.uri().path(), error = %e, "Authentication failed");
        e
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::MissingToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use filevault_shared::Role;
    use rstest::rstest;
    use uuid::Uuid;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer"))]
    #[case(Some("Bearer   "))]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[case(Some("eyJhbGciOiJIUzI1NiJ9"))]
    fn test_missing_token(#[case] value: Option<&str>) {
        assert_eq!(bearer_token(&headers(value)), Err(AuthError::MissingToken));
    }

    #[rstest]
    #[case("Bearer abc.def.ghi", "abc.def.ghi")]
    #[case("bearer abc", "abc")]
    #[case("Bearer  padded ", "padded")]
    fn test_bearer_token_extracted(#[case] value: &str, #[case] expected: &str) {
        let headers = headers(Some(value));
        assert_eq!(bearer_token(&headers), Ok(expected));
    }

    #[test]
    fn test_identify_valid_and_invalid() {
        let jwt = JwtService::new("secret", "issuer", 3600);
        let identity = Identity {
            user_uuid: Uuid::new_v4(),
            email: "a@b.co".to_string(),
            role: Role::User,
        };
        let token = jwt.issue(&identity).unwrap();

        let ok = identify(&jwt, &headers(Some(&format!("Bearer {}", token))));
        assert_eq!(ok, Ok(identity));

        let bad = identify(&jwt, &headers(Some("Bearer not-a-token")));
        assert_eq!(bad, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_identity_extractor_reads_gate_extension() {
        use axum::extract::FromRequestParts;

        let identity = Identity {
            user_uuid: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            role: Role::Admin,
        };
        let (mut parts, _) = axum::http::Request::builder()
            .extension(identity.clone())
            .body(())
            .unwrap()
            .into_parts();

        let extracted = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, identity);
    }

    #[tokio::test]
    async fn test_identity_extractor_without_gate_is_missing_token() {
        use axum::extract::FromRequestParts;

        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();

        let err = Identity::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::MissingToken)));
    }
}
