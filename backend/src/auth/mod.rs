//! Authentication and authorization
//!
//! bcrypt password hashing, JWT identity assertions, the authentication
//! gate, and the role/ownership policies composed after it.

mod jwt;
mod middleware;
mod password;
pub mod policy;

pub use jwt::{Claims, Identity, JwtService};
pub use middleware::{authenticate, bearer_token, identify};
pub use password::PasswordService;
pub use policy::{admin_only, require_admin, require_self_or_admin, self_or_admin};
