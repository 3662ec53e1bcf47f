//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the credential hasher and the token codec.

pub mod file;
pub mod user;

pub use file::FileService;
pub use user::UserService;
