// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{Claims, JwtError};
use crate::config::JwtConfig;
use crate::roles::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// Stateless session tokens: HS256-signed JWTs carrying the username and
/// role. There is no server-side session state and no revocation list.
pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    expiration_hours: u64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        JwtService {
            secret: config.secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_hours: config.expiration_hours,
        }
    }

    /// Create a session token for an authenticated account
    pub fn create_token(&self, username: &str, role: Role) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.expiration_hours as i64);

        let claims = Claims {
            sub: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| JwtError::TokenCreation(e.to_string()))?;

        Ok(token)
    }

    /// Verify a session token and return its claims. Signature, expiry,
    /// issuer and audience are all checked.
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| JwtError::TokenVerification(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(secret: &str) -> JwtService {
        JwtService {
            secret: secret.to_string(),
            issuer: "examport".to_string(),
            audience: "examport-users".to_string(),
            expiration_hours: 12,
        }
    }

    #[test]
    fn create_and_verify_round_trip() {
        let service = test_service("test-secret-key");
        let token = service.create_token("alice", Role::Student).unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.iss, "examport");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let service = test_service("test-secret-key");
        let token = service.create_token("alice", Role::Student).unwrap();

        let other = test_service("different-secret");
        assert!(matches!(
            other.verify_token(&token),
            Err(JwtError::TokenVerification(_))
        ));
    }

    #[test]
    fn verify_rejects_wrong_issuer() {
        let service = test_service("test-secret-key");
        let token = service.create_token("alice", Role::Admin).unwrap();

        let mut other = test_service("test-secret-key");
        other.issuer = "someone-else".to_string();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let service = test_service("test-secret-key");
        let now = Utc::now();
        let claims = Claims {
            sub: "alice".to_string(),
            role: Role::Student,
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            iss: "examport".to_string(),
            aud: "examport-users".to_string(),
            jti: "expired-jti".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key".as_ref()),
        )
        .unwrap();

        assert!(matches!(
            service.verify_token(&token),
            Err(JwtError::TokenVerification(_))
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let service = test_service("test-secret-key");
        assert!(service.verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn tokens_carry_unique_ids() {
        let service = test_service("test-secret-key");
        let a = service.create_token("alice", Role::Student).unwrap();
        let b = service.create_token("alice", Role::Student).unwrap();
        let claims_a = service.verify_token(&a).unwrap();
        let claims_b = service.verify_token(&b).unwrap();
        assert_ne!(claims_a.jti, claims_b.jti);
    }
}
