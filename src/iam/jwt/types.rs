// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // Subject (username)
    pub role: Role,   // Account role
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration
    pub iss: String,  // Issuer
    pub aud: String,  // Audience
    pub jti: String,  // JWT ID
}

#[derive(Debug, Clone)]
pub enum JwtError {
    TokenCreation(String),
    TokenVerification(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenCreation(msg) => write!(f, "Token creation error: {}", msg),
            JwtError::TokenVerification(msg) => write!(f, "Token verification error: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_round_trip_preserves_role() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": "alice",
            "role": "instructor",
            "iat": 1700000000,
            "exp": 1700043200,
            "iss": "examport",
            "aud": "examport-users",
            "jti": "jwt-id"
        }))
        .expect("claims should deserialize");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Instructor);
    }
}
