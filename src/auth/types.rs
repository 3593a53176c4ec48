// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub email_verified: bool,
    pub verification_email_sent: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub gender: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub success: bool,
    pub message: String,
}

/// Errors surfaced by the authentication service. Variants map one-to-one
/// onto client-visible responses; anything else becomes a 500.
#[derive(Debug)]
pub enum AuthError {
    UsernameTaken,
    EmailTaken,
    InvalidCredentials,
    Validation(String),
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::UsernameTaken => write!(f, "Username already exists"),
            AuthError::EmailTaken => write!(f, "Email already exists"),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::Validation(msg) => write!(f, "{}", msg),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_request_accepts_camel_case() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1",
            "fullName": "Alice Smith",
            "phoneNumber": "555-0000"
        }))
        .expect("deserialize");

        assert_eq!(request.full_name.as_deref(), Some("Alice Smith"));
        assert_eq!(request.phone_number.as_deref(), Some("555-0000"));
        assert!(request.role.is_none());
    }

    #[test]
    fn login_response_serializes_camel_case() {
        let response = LoginResponse {
            token: "jwt".to_string(),
            username: "alice".to_string(),
            role: Role::Student,
            full_name: "Alice Smith".to_string(),
            avatar_url: None,
            gender: None,
            timestamp: 1700000000000,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("fullName").is_some());
        assert!(json.get("avatarUrl").is_some());
        assert_eq!(json["role"], "student");
    }
}
