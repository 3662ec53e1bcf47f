//! User repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use filevault_shared::{Role, UserResponse};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// Name of the unique constraint guarding `users.email`
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Parsed role; an unrecognized value degrades to the least privilege
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|_| {
            warn!(user = %self.uuid, role = %self.role, "Unknown role in database");
            Role::User
        })
    }

    /// Public view, without the password hash
    pub fn into_response(self) -> UserResponse {
        let role = self.role();
        UserResponse {
            id: self.id,
            uuid: self.uuid,
            name: self.name,
            email: self.email,
            role,
            age: self.age,
            created_at: self.created_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub age: Option<i32>,
}

const USER_COLUMNS: &str = "id, uuid, name, email, password_hash, role, age, created_at";

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Insert a new user
    ///
    /// A duplicate email surfaces as a unique violation on
    /// [`EMAIL_UNIQUE_CONSTRAINT`].
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (uuid, name, email, password_hash, role, age)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(input.uuid)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .bind(input.age)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Check whether an email is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Check whether a user uuid exists
    pub async fn exists(pool: &PgPool, uuid: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE uuid = $1)")
            .bind(uuid)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Find user by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find user by external uuid
    pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// List every user, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
