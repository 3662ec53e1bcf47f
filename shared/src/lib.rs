//! FileVault Shared Library
//!
//! This crate contains the wire types, roles, and input validation shared
//! between the backend and any client of the FileVault API.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::Role;
pub use types::*;
