//! Input validation functions
//!
//! Validators return the user-facing message on failure.

use crate::types::RegisterRequest;
use std::sync::OnceLock;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum accepted password length, in characters
pub const MAX_PASSWORD_LENGTH: usize = 128;

fn email_regex() -> &'static regex_lite::Regex {
    static EMAIL: OnceLock<regex_lite::Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email_regex().is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validated registration input
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
}

/// Validate a registration request
///
/// Checks run in a fixed order: required fields, email shape, password
/// length, then age range.
pub fn validate_registration(req: &RegisterRequest) -> Result<NewAccount, String> {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let (Some(name), Some(email), Some(password)) = (
        non_empty(&req.name),
        non_empty(&req.email),
        req.password.clone().filter(|p| !p.is_empty()),
    ) else {
        return Err("Name, email and password are required".to_string());
    };

    validate_email(&email)?;
    validate_password(&password)?;

    if let Some(age) = req.age {
        if !(0..=150).contains(&age) {
            return Err("Age must be between 0 and 150".to_string());
        }
    }

    Ok(NewAccount {
        name,
        email,
        password,
        age: req.age,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            age: None,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@dot").is_err());
        assert!(validate_email("spaces in@email.com").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[rstest]
    #[case("123456", true)]
    #[case("secret-password", true)]
    #[case("12345", false)]
    #[case("", false)]
    fn test_validate_password(#[case] password: &str, #[case] ok: bool) {
        assert_eq!(validate_password(password).is_ok(), ok);
    }

    #[test]
    fn test_password_too_long() {
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[rstest]
    #[case(RegisterRequest::default())]
    #[case(RegisterRequest { name: Some("Ada".into()), ..Default::default() })]
    #[case(RegisterRequest { name: Some("  ".into()), email: Some("a@b.co".into()), password: Some("secret1".into()), age: None })]
    fn test_registration_requires_fields(#[case] req: RegisterRequest) {
        assert_eq!(
            validate_registration(&req).unwrap_err(),
            "Name, email and password are required"
        );
    }

    #[test]
    fn test_registration_checks_email_before_password() {
        let err = validate_registration(&request("Ada", "nope", "1")).unwrap_err();
        assert_eq!(err, "Invalid email format");
    }

    #[test]
    fn test_registration_short_password() {
        let err = validate_registration(&request("Ada", "ada@example.com", "12345")).unwrap_err();
        assert_eq!(err, "Password must be at least 6 characters long");
    }

    #[test]
    fn test_registration_rejects_negative_age() {
        let mut req = request("Ada", "ada@example.com", "123456");
        req.age = Some(-1);
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_registration_trims_name_and_email() {
        let account = validate_registration(&request(" Ada ", " ada@example.com ", "123456")).unwrap();
        assert_eq!(account.name, "Ada");
        assert_eq!(account.email, "ada@example.com");
    }

    proptest! {
        #[test]
        fn prop_well_formed_emails_accepted(
            local in "[a-z0-9._]{1,20}",
            domain in "[a-z0-9]{1,20}",
            tld in "[a-z]{2,6}"
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            prop_assert!(validate_email(&email).is_ok());
        }

        #[test]
        fn prop_emails_without_at_rejected(s in "[a-z0-9.]{1,40}") {
            prop_assert!(validate_email(&s).is_err());
        }
    }
}
