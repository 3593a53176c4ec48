// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use validator::ValidateEmail;

pub const MAX_EMAIL_CHARS: usize = 128;
pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_NAME_CHARS: usize = 256;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// Validate user email input
pub fn validate_email_field(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required".to_string());
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_CHARS
        ));
    }
    if !trimmed.validate_email() {
        return Err("Email format is invalid".to_string());
    }
    Ok(())
}

/// Validate a username for account creation
/// Must only contain letters, numbers, dashes, underscores, and periods
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_CHARS
        ));
    }

    for char in username.chars() {
        if !char.is_ascii_alphanumeric() && char != '-' && char != '_' && char != '.' {
            return Err(
                "Username can only contain letters and numbers, dashes, underscores, and periods"
                    .to_string(),
            );
        }
    }

    Ok(())
}

/// Validate a plaintext password against the configured minimum length
pub fn validate_password(password: &str, min_chars: usize) -> Result<(), String> {
    let length = password.chars().count();
    if length < min_chars {
        return Err(format!(
            "Password must be at least {} characters",
            min_chars
        ));
    }
    if length > MAX_PASSWORD_CHARS {
        return Err(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_CHARS
        ));
    }
    Ok(())
}

/// Validate a display name
pub fn validate_full_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Full name is required".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(format!(
            "Full name must be at most {} characters",
            MAX_NAME_CHARS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_field() {
        assert!(validate_email_field("user@example.com").is_ok());
        assert!(validate_email_field("  user@example.com  ").is_ok());
        assert!(validate_email_field("").is_err());
        assert!(validate_email_field("not-an-email").is_err());
        let long_email = format!("{}@example.com", "a".repeat(MAX_EMAIL_CHARS));
        assert!(validate_email_field(&long_email).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice-smith_01.x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("alice smith").is_err()); // spaces
        assert!(validate_username("alice@host").is_err()); // special chars
        assert!(validate_username("a/b").is_err()); // slashes
        assert!(validate_username(&"a".repeat(MAX_USERNAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret", 6).is_ok());
        assert!(validate_password("short", 6).is_err());
        assert!(validate_password("", 6).is_err());
        assert!(validate_password(&"p".repeat(MAX_PASSWORD_CHARS + 1), 6).is_err());
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Alice Smith").is_ok());
        assert!(validate_full_name("   ").is_err());
        assert!(validate_full_name(&"A".repeat(MAX_NAME_CHARS + 1)).is_err());
    }
}
