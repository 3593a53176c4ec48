// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{AuthError, RegisterRequest};
use crate::config::AppConfig;
use crate::email::Notifier;
use crate::iam::jwt::{Claims, JwtService};
use crate::iam::{
    Account, CredentialHasher, DirectoryService, IamError, Identity, TokenPurpose, TokenService,
};
use crate::roles::Role;
use crate::security::validation::{
    validate_email_field, validate_full_name, validate_password, validate_username,
};
use std::sync::Arc;

#[derive(Debug)]
pub struct RegisterOutcome {
    pub account: Account,
    pub verification_email_sent: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResendOutcome {
    NoAccount,
    AlreadyVerified,
    Sent,
    SendFailed,
}

/// High-level authentication service tying together the account directory,
/// secondary tokens, session tokens and outbound email.
pub struct AuthService {
    directory: DirectoryService,
    tokens: TokenService,
    jwt: JwtService,
    hasher: CredentialHasher,
    mailer: Arc<dyn Notifier>,
    dummy_stored_hash: String,
    min_password_chars: usize,
}

impl AuthService {
    pub fn new(
        config: &AppConfig,
        directory: DirectoryService,
        mailer: Arc<dyn Notifier>,
    ) -> Result<Self, AuthError> {
        let hasher = CredentialHasher::new(&config.security.password_hashing)
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        // Hashed once at startup so failed logins for unknown usernames cost
        // the same as for known ones
        let dummy_stored_hash = hasher
            .hash("dummy-password")
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        Ok(AuthService {
            directory,
            tokens: TokenService::new(&config.tokens),
            jwt: JwtService::new(&config.jwt),
            hasher,
            mailer,
            dummy_stored_hash,
            min_password_chars: config.security.min_password_chars,
        })
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new account and send the verification email. Email
    /// delivery failure does not fail the registration.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, AuthError> {
        validate_username(&request.username).map_err(AuthError::Validation)?;
        validate_email_field(&request.email).map_err(AuthError::Validation)?;
        validate_password(&request.password, self.min_password_chars)
            .map_err(AuthError::Validation)?;
        if let Some(full_name) = &request.full_name {
            validate_full_name(full_name).map_err(AuthError::Validation)?;
        }

        if self
            .directory
            .exists_by_username(&request.username)
            .map_err(|err| AuthError::Internal(err.to_string()))?
        {
            log::warn!(
                "Registration failed - Username already exists: {}",
                request.username
            );
            return Err(AuthError::UsernameTaken);
        }
        if self
            .directory
            .exists_by_email(&request.email)
            .map_err(|err| AuthError::Internal(err.to_string()))?
        {
            log::warn!(
                "Registration failed - Email already exists: {}",
                request.email
            );
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        let account = Account {
            username: request.username.clone(),
            email: request.email.trim().to_string(),
            password_hash,
            role: request.role.unwrap_or(Role::Student),
            full_name: request.full_name.unwrap_or_else(|| request.username.clone()),
            avatar_url: request.avatar_url,
            gender: request.gender,
            phone: request.phone_number,
            email_verified: false,
        };

        // The directory re-checks uniqueness inside its mutation task, so
        // a concurrent registration for the same name loses cleanly here.
        self.directory
            .create_account(account.clone())
            .await
            .map_err(|err| match err {
                IamError::UsernameTaken(_) => AuthError::UsernameTaken,
                IamError::EmailTaken(_) => AuthError::EmailTaken,
                other => AuthError::Internal(other.to_string()),
            })?;

        let verification_email_sent = self.send_email_verification(&account).await;
        log::info!(
            "User registered successfully: {} with role: {}",
            account.username,
            account.role
        );

        Ok(RegisterOutcome {
            account,
            verification_email_sent,
        })
    }

    /// Issue a verification token and email it. Returns whether the email
    /// went out.
    async fn send_email_verification(&self, account: &Account) -> bool {
        let token = match self
            .tokens
            .issue(&account.username, TokenPurpose::EmailVerification)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                log::error!(
                    "Failed to issue verification token for {}: {}",
                    account.email,
                    err
                );
                return false;
            }
        };

        match self
            .mailer
            .send_verification_link(&account.email, &token)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "Failed to send email verification for {}: {}",
                    account.email,
                    err
                );
                false
            }
        }
    }

    /// Authenticate and mint a session token. Unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, Account), AuthError> {
        let account = self
            .directory
            .get_by_username(username)
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        let stored_hash = match account.as_ref() {
            Some(account) => account.password_hash.as_str(),
            None => self.dummy_stored_hash.as_str(),
        };

        let valid = self.hasher.verify(password, stored_hash);
        let account = match account {
            Some(account) if valid => account,
            _ => {
                log::warn!("Login failed for username: {}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self
            .jwt
            .create_token(&account.username, account.role)
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        log::info!(
            "User logged in successfully: {} with role: {}",
            account.username,
            account.role
        );
        Ok((token, account))
    }

    /// Verify a bearer token and confirm the account still exists. Used by
    /// the authentication middleware on every request.
    pub fn validate_session(&self, token: &str) -> Result<Option<(Claims, Identity)>, IamError> {
        let claims = match self.jwt.verify_token(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(None),
        };

        let account = match self.directory.get_by_username(&claims.sub)? {
            Some(account) => account,
            None => {
                log::warn!("Session token for deleted account: {}", claims.sub);
                return Ok(None);
            }
        };

        let identity = Identity {
            username: account.username,
            role: account.role,
        };
        Ok(Some((claims, identity)))
    }

    /// Consume a verification token and mark the account's email verified.
    /// Returns false when the token is unknown, used or expired.
    pub async fn verify_email(&self, token: &str) -> Result<bool, AuthError> {
        let record = match self
            .tokens
            .consume(token, TokenPurpose::EmailVerification)
            .await
            .map_err(|err| AuthError::Internal(err.message().to_string()))?
        {
            Some(record) => record,
            None => {
                log::warn!("Email verification failed - token invalid or expired");
                return Ok(false);
            }
        };

        // Restore the token on failure so the link in the user's inbox
        // still works once the directory recovers
        if let Err(err) = self.directory.set_email_verified(&record.username).await {
            if let Err(restore_err) = self.tokens.restore(token).await {
                log::error!(
                    "Failed to restore verification token for {}: {}",
                    record.username,
                    restore_err
                );
            }
            return Err(AuthError::Internal(err.to_string()));
        }

        log::info!("Email verified successfully for user: {}", record.username);
        Ok(true)
    }

    /// Issue a password reset token and email it. Never reveals whether the
    /// email belongs to an account; failures are logged and swallowed.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let account = match self
            .directory
            .get_by_email(email)
            .map_err(|err| AuthError::Internal(err.to_string()))?
        {
            Some(account) => account,
            None => {
                log::warn!("Password reset requested for non-existent email: {}", email);
                return Ok(());
            }
        };

        let token = match self
            .tokens
            .issue(&account.username, TokenPurpose::PasswordReset)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                log::error!("Failed to issue reset token for {}: {}", email, err);
                return Ok(());
            }
        };

        if let Err(err) = self
            .mailer
            .send_password_reset_link(&account.email, &token)
            .await
        {
            log::error!("Failed to send password reset email for {}: {}", email, err);
        } else {
            log::info!("Password reset token sent to user: {}", email);
        }
        Ok(())
    }

    /// Consume a reset token and replace the account's credential. Any
    /// other outstanding reset tokens for the account are invalidated.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<bool, AuthError> {
        validate_password(new_password, self.min_password_chars).map_err(AuthError::Validation)?;

        let record = match self
            .tokens
            .consume(token, TokenPurpose::PasswordReset)
            .await
            .map_err(|err| AuthError::Internal(err.message().to_string()))?
        {
            Some(record) => record,
            None => {
                log::warn!("Password reset failed - token invalid or expired");
                return Ok(false);
            }
        };

        let password_hash = match self.hasher.hash(new_password) {
            Ok(password_hash) => password_hash,
            Err(err) => {
                self.restore_reset_token(token, &record.username).await;
                return Err(AuthError::Internal(err.to_string()));
            }
        };

        if let Err(err) = self
            .directory
            .set_password_hash(&record.username, &password_hash)
            .await
        {
            self.restore_reset_token(token, &record.username).await;
            return Err(AuthError::Internal(err.to_string()));
        }

        // Sweep any reset tokens issued before this one was consumed
        if let Err(err) = self
            .tokens
            .invalidate_all(&record.username, TokenPurpose::PasswordReset)
            .await
        {
            log::error!(
                "Failed to invalidate remaining reset tokens for {}: {}",
                record.username,
                err
            );
        }

        log::info!("Password reset successfully for user: {}", record.username);
        Ok(true)
    }

    async fn restore_reset_token(&self, token: &str, username: &str) {
        if let Err(err) = self.tokens.restore(token).await {
            log::error!("Failed to restore reset token for {}: {}", username, err);
        }
    }

    /// Re-send the verification email for an unverified account.
    pub async fn resend_verification(&self, email: &str) -> Result<ResendOutcome, AuthError> {
        let account = match self
            .directory
            .get_by_email(email)
            .map_err(|err| AuthError::Internal(err.to_string()))?
        {
            Some(account) => account,
            None => return Ok(ResendOutcome::NoAccount),
        };

        if account.email_verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        if self.send_email_verification(&account).await {
            Ok(ResendOutcome::Sent)
        } else {
            Ok(ResendOutcome::SendFailed)
        }
    }
}
