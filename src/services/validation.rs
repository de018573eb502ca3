//! Field-level validation for registration and password input.

use regex::Regex;
use std::sync::LazyLock;

use super::auth_service::AuthError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username regex"));

// RFC-approximate: something, an @, a domain with at least one dot.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub fn validate_username(username: &str) -> Result<&str, AuthError> {
    if !(3..=80).contains(&username.len()) {
        return Err(AuthError::Validation {
            field: "username",
            message: "Username must be between 3 and 80 characters".to_string(),
        });
    }

    if !USERNAME_RE.is_match(username) {
        return Err(AuthError::Validation {
            field: "username",
            message: "Username can only contain letters, numbers, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(username)
}

pub fn validate_email(email: &str) -> Result<&str, AuthError> {
    if email.is_empty() || !EMAIL_RE.is_match(email) {
        return Err(AuthError::Validation {
            field: "email",
            message: "A valid email address is required".to_string(),
        });
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> Result<&str, AuthError> {
    if password.len() < 6 {
        return Err(AuthError::Validation {
            field: "password",
            message: "Password must be at least 6 characters".to_string(),
        });
    }

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_b-c123").is_ok());
        assert!(validate_username(&"x".repeat(80)).is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"x".repeat(81)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("nope!").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("missing@dot").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("123456").is_ok());

        assert!(validate_password("123").is_err());
        assert!(validate_password("").is_err());
    }
}
