//! JWT token issuance and verification
//!
//! Tokens are HS256-signed identity assertions with a fixed lifetime and an
//! issuer claim. There is no refresh flow and no revocation list: a token
//! stays valid until `exp`.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use filevault_shared::{AuthError, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user uuid)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated identity carried by a token
///
/// `user_uuid` is the only handle ownership checks compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_uuid: Uuid,
    pub email: String,
    pub role: Role,
}

impl Identity {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// JWT service for token operations
///
/// Keys and validation rules are built once at startup and shared through
/// `AppState`.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    issuer: Arc<str>,
    expiry_secs: i64,
    validation: Arc<Validation>,
}

impl JwtService {
    /// Create a new JWT service with pre-computed keys
    pub fn new(secret: &str, issuer: &str, expiry_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            keys: JwtKeys::new(secret),
            issuer: Arc::from(issuer),
            expiry_secs,
            validation: Arc::new(validation),
        }
    }

    /// Issue a token for an identity, valid from now
    #[inline]
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String> {
        let exp = issued_at + Duration::seconds(self.expiry_secs);

        let claims = Claims {
            sub: identity.user_uuid.to_string(),
            email: identity.email.clone(),
            role: identity.role,
            iss: self.issuer.to_string(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate token: {}", e))
    }

    /// Validate a token and return its claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }

    /// Verify a token and return the identity it asserts
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token)?;

        let user_uuid = Uuid::parse_str(&claims.sub).map_err(|_| {
            debug!("Token subject is not a uuid");
            AuthError::InvalidToken
        })?;

        Ok(Identity {
            user_uuid,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn expiry_secs(&self) -> i64 {
        self.expiry_secs
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY: i64 = 24 * 60 * 60;

    fn create_test_service() -> JwtService {
        JwtService::new("test-secret", "filevault-test", DAY)
    }

    fn identity(role: Role) -> Identity {
        Identity {
            user_uuid: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = create_test_service();
        let id = identity(Role::User);

        let token = service.issue(&id).unwrap();
        let verified = service.verify(&token).unwrap();

        assert_eq!(verified, id);
    }

    #[test]
    fn test_claims_carry_issuer_and_24h_expiry() {
        let service = create_test_service();
        let token = service.issue(&identity(Role::Admin)).unwrap();
        let claims = service.decode_claims(&token).unwrap();

        assert_eq!(claims.iss, "filevault-test");
        assert_eq!(claims.exp - claims.iat, DAY);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = create_test_service();
        let issued = Utc::now() - Duration::seconds(DAY + 5);
        let token = service.issue_at(&identity(Role::User), issued).unwrap();

        assert_eq!(service.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_token_just_before_expiry_accepted() {
        let service = create_test_service();
        let issued = Utc::now() - Duration::seconds(DAY - 60);
        let token = service.issue_at(&identity(Role::User), issued).unwrap();

        assert!(service.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = JwtService::new("another-secret", "filevault-test", DAY);
        let token = other.issue(&identity(Role::Admin)).unwrap();

        assert_eq!(create_test_service().verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = JwtService::new("test-secret", "someone-else", DAY);
        let token = other.issue(&identity(Role::User)).unwrap();

        assert_eq!(create_test_service().verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = create_test_service();
        let token = service.issue(&identity(Role::User)).unwrap();

        // Swap the payload for one claiming admin, keep the original signature
        let admin_token = service.issue(&identity(Role::Admin)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert_eq!(service.verify(&forged), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = create_test_service();
        assert_eq!(service.verify("invalid.token.here"), Err(AuthError::InvalidToken));
        assert_eq!(service.verify(""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_service_is_clone_cheap() {
        let service = create_test_service();
        let cloned = service.clone();
        let token = service.issue(&identity(Role::User)).unwrap();
        assert!(cloned.verify(&token).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: verify(issue(identity)) returns the identity unchanged
        #[test]
        fn prop_issue_verify_round_trip(
            email in "[a-z]{1,12}@[a-z]{1,12}\\.[a-z]{2,4}",
            admin in any::<bool>()
        ) {
            let service = create_test_service();
            let id = Identity {
                user_uuid: Uuid::new_v4(),
                email,
                role: if admin { Role::Admin } else { Role::User },
            };
            let token = service.issue(&id).unwrap();
            prop_assert_eq!(service.verify(&token).unwrap(), id);
        }

        /// Property: arbitrary strings never verify
        #[test]
        fn prop_garbage_never_verifies(token in "[a-zA-Z0-9_.-]{0,80}") {
            prop_assert!(create_test_service().verify(&token).is_err());
        }
    }
}
