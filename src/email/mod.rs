// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod brevo;

pub use brevo::BrevoMailer;

use crate::config::EmailConfig;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub enum MailerError {
    Configuration(String),
    Request(String),
    Status(u16, String),
}

impl std::fmt::Display for MailerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailerError::Configuration(msg) => write!(f, "Mailer configuration error: {}", msg),
            MailerError::Request(msg) => write!(f, "Mail delivery request failed: {}", msg),
            MailerError::Status(status, body) => {
                write!(f, "Mail provider returned status {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for MailerError {}

/// Outbound notifications carrying secondary-token links.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification_link(&self, to_email: &str, token: &str) -> Result<(), MailerError>;
    async fn send_password_reset_link(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), MailerError>;
}

/// Mailer used when email delivery is disabled. Logs instead of sending.
pub struct NoopMailer;

#[async_trait]
impl Notifier for NoopMailer {
    async fn send_verification_link(
        &self,
        to_email: &str,
        _token: &str,
    ) -> Result<(), MailerError> {
        log::info!(
            "Email delivery is disabled. Skipping verification email for: {}",
            to_email
        );
        Ok(())
    }

    async fn send_password_reset_link(
        &self,
        to_email: &str,
        _token: &str,
    ) -> Result<(), MailerError> {
        log::info!(
            "Email delivery is disabled. Skipping password reset email for: {}",
            to_email
        );
        Ok(())
    }
}

pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Notifier>, MailerError> {
    if config.enabled {
        Ok(Arc::new(BrevoMailer::new(config)?))
    } else {
        Ok(Arc::new(NoopMailer))
    }
}
