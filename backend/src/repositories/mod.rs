//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod file;
pub mod user;

pub use file::{CreateFileRecord, FileRecord, FileRepository};
pub use user::{CreateUser, UserRecord, UserRepository, EMAIL_UNIQUE_CONSTRAINT};
