//! User service for registration, login and account lookup
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - JWT service is passed by reference (pre-computed keys)

use crate::auth::{Identity, JwtService, PasswordService};
use crate::db;
use crate::error::ApiError;
use crate::repositories::{CreateUser, UserRecord, UserRepository, EMAIL_UNIQUE_CONSTRAINT};
use filevault_shared::validation::validate_registration;
use filevault_shared::{AuthError, AuthResponse, LoginRequest, RegisterRequest, Role, UserResponse};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const DUPLICATE_EMAIL: &str = "Email already registered";

/// User service for authentication operations
pub struct UserService;

impl UserService {
    /// Identity asserted for a stored user
    pub fn identity_of(user: &UserRecord) -> Identity {
        Identity {
            user_uuid: user.uuid,
            email: user.email.clone(),
            role: user.role(),
        }
    }

    /// Register a new user
    ///
    /// Validation runs before any store access. A duplicate email is a
    /// conflict whether the pre-check or the unique constraint catches it.
    pub async fn register(
        pool: &PgPool,
        jwt_service: &JwtService,
        passwords: &PasswordService,
        req: &RegisterRequest,
    ) -> Result<AuthResponse, ApiError> {
        let account = validate_registration(req).map_err(ApiError::Validation)?;

        if UserRepository::email_exists(pool, &account.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        // Hash password on blocking thread pool (CPU-intensive)
        let password_hash = passwords
            .hash_async(account.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(
            pool,
            CreateUser {
                uuid: Uuid::new_v4(),
                name: account.name,
                email: account.email,
                password_hash,
                role: Role::User,
                age: account.age,
            },
        )
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e, EMAIL_UNIQUE_CONSTRAINT) {
                ApiError::Conflict(DUPLICATE_EMAIL.to_string())
            } else {
                ApiError::Internal(e)
            }
        })?;

        let token = jwt_service
            .issue(&Self::identity_of(&user))
            .map_err(ApiError::Internal)?;

        info!(user = %user.uuid, "User registered");

        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into_response(),
            token,
        })
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password fail identically, and both spend
    /// one hash verification.
    pub async fn login(
        pool: &PgPool,
        jwt_service: &JwtService,
        passwords: &PasswordService,
        req: &LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        let Some(user) = UserRepository::find_by_email(pool, req.email.trim())
            .await
            .map_err(ApiError::Internal)?
        else {
            passwords
                .burn_verification(req.password.clone())
                .await
                .map_err(ApiError::Internal)?;
            return Err(AuthError::InvalidCredentials.into());
        };

        // Verify password on blocking thread pool (CPU-intensive)
        let valid = PasswordService::verify_async(req.password.clone(), user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;

        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = jwt_service
            .issue(&Self::identity_of(&user))
            .map_err(ApiError::Internal)?;

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            user: user.into_response(),
            token,
        })
    }

    /// List all users
    pub async fn list_users(pool: &PgPool) -> Result<Vec<UserResponse>, ApiError> {
        let users = UserRepository::list(pool).await.map_err(ApiError::Internal)?;
        Ok(users.into_iter().map(UserRecord::into_response).collect())
    }

    /// Get a single user by uuid
    pub async fn get_user(pool: &PgPool, uuid: Uuid) -> Result<UserResponse, ApiError> {
        UserRepository::find_by_uuid(pool, uuid)
            .await
            .map_err(ApiError::Internal)?
            .map(UserRecord::into_response)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}
