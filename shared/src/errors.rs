//! Error types for the FileVault application

use thiserror::Error;

/// Authentication error types
///
/// The message text is what callers see; keep it generic so a failure never
/// reveals which half of a credential pair was wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Access token required")]
    MissingToken,
}

impl AuthError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AuthError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(AuthError::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(AuthError::MissingToken.code(), "MISSING_TOKEN");
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::MissingToken.to_string(), "Access token required");
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Incorrect email or password"
        );
    }
}
