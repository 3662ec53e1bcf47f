//! Authorization policies
//!
//! Pure predicates over an authenticated [`Identity`], plus middleware
//! wrappers for mounting them on routes. The wrappers expect
//! [`authenticate`](super::authenticate) to have run first and treat a
//! missing identity as an unauthenticated request.

use crate::auth::jwt::Identity;
use crate::error::ApiError;
use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
};
use filevault_shared::AuthError;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Route parameter naming the user a request targets
pub const TARGET_USER_PARAM: &str = "uuid";

/// Passes iff the identity holds the admin role
pub fn admin_only(identity: &Identity) -> Result<(), ApiError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Access denied. Administrator role required.".to_string(),
        ))
    }
}

/// Passes iff the identity is an admin or is the target user
///
/// `target` is the raw route parameter; anything that is not a uuid never
/// matches a regular user.
pub fn self_or_admin(identity: &Identity, target: &str) -> Result<(), ApiError> {
    if identity.is_admin() {
        return Ok(());
    }

    match Uuid::parse_str(target) {
        Ok(target) if target == identity.user_uuid => Ok(()),
        _ => Err(ApiError::Forbidden(
            "You cannot access other users' data.".to_string(),
        )),
    }
}

fn identity_of(request: &Request) -> Result<&Identity, ApiError> {
    request
        .extensions()
        .get::<Identity>()
        .ok_or(ApiError::Auth(AuthError::MissingToken))
}

/// Middleware enforcing [`admin_only`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    admin_only(identity_of(&request)?)?;
    Ok(next.run(request).await)
}

/// Middleware enforcing [`self_or_admin`] against the `:uuid` route parameter
pub async fn require_self_or_admin(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identity_of(&request)?;
    let target = params
        .get(TARGET_USER_PARAM)
        .map(String::as_str)
        .unwrap_or_default();

    if let Err(e) = self_or_admin(identity, target) {
        debug!(user = %identity.user_uuid, target, "Ownership check failed");
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filevault_shared::Role;
    use proptest::prelude::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_uuid: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_only() {
        assert!(admin_only(&identity(Role::Admin)).is_ok());
        assert!(matches!(
            admin_only(&identity(Role::User)),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_user_may_access_self() {
        let me = identity(Role::User);
        assert!(self_or_admin(&me, &me.user_uuid.to_string()).is_ok());
        assert!(self_or_admin(&me, &me.user_uuid.to_string().to_uppercase()).is_ok());
    }

    #[test]
    fn test_user_may_not_access_others() {
        let me = identity(Role::User);
        let other = Uuid::new_v4().to_string();
        assert!(matches!(self_or_admin(&me, &other), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_unparsable_target_never_matches_user() {
        let me = identity(Role::User);
        assert!(self_or_admin(&me, "").is_err());
        assert!(self_or_admin(&me, "1").is_err());
        assert!(self_or_admin(&identity(Role::Admin), "1").is_ok());
    }

    proptest! {
        /// Property: admins pass for any target
        #[test]
        fn prop_admin_passes_any_target(target in ".{0,64}") {
            prop_assert!(self_or_admin(&identity(Role::Admin), &target).is_ok());
        }

        /// Property: a user passes iff the target is their own uuid
        #[test]
        fn prop_user_passes_iff_self(a in any::<u128>(), b in any::<u128>()) {
            let me = Identity {
                user_uuid: Uuid::from_u128(a),
                email: "me@example.com".to_string(),
                role: Role::User,
            };
            let target = Uuid::from_u128(b);
            prop_assert_eq!(
                self_or_admin(&me, &target.to_string()).is_ok(),
                a == b
            );
        }
    }
}
