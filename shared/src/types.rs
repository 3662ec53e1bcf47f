//! API request and response types

use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Registration request
///
/// Fields are optional on the wire so a missing field surfaces as a
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user account (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Response for successful registration and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

/// Stored file metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileResponse {
    pub id: i32,
    pub uuid: Uuid,
    pub user_uuid: Uuid,
    pub filename: String,
    pub filepath: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Generic message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
