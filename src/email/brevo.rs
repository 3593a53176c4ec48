// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{MailerError, Notifier};
use crate::config::EmailConfig;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

/// Notifier backed by the Brevo transactional email API.
pub struct BrevoMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
    frontend_base_url: String,
}

impl BrevoMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        if config.api_key.trim().is_empty() {
            return Err(MailerError::Configuration(
                "email.api_key is required when email is enabled".to_string(),
            ));
        }
        if config.sender_email.trim().is_empty() {
            return Err(MailerError::Configuration(
                "email.sender_email is required when email is enabled".to_string(),
            ));
        }

        Ok(BrevoMailer {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
            frontend_base_url: config.frontend_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html: String,
        text: String,
    ) -> Result<(), MailerError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to_email.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: Some(html),
            text_content: Some(text),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| MailerError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailerError::Status(status.as_u16(), body))
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!(
            "{}/{}?token={}",
            self.frontend_base_url,
            path,
            urlencoding::encode(token)
        )
    }
}

#[async_trait]
impl Notifier for BrevoMailer {
    async fn send_verification_link(&self, to_email: &str, token: &str) -> Result<(), MailerError> {
        let url = self.link("verify-email", token);
        let html = format!(
            "<p>Welcome to ExamPort!</p>\
             <p>Please verify your email address by clicking the link below:</p>\
             <p><a href=\"{url}\">Verify Email Address</a></p>\
             <p>If the link doesn't work, copy and paste it into your browser:<br>{url}</p>\
             <p>This verification link will expire in 24 hours.</p>\
             <p>If you didn't create an account, please ignore this email.</p>"
        );
        let text = format!(
            "Welcome to ExamPort!\n\n\
             Please verify your email address by opening this link:\n{url}\n\n\
             This verification link will expire in 24 hours.\n\
             If you didn't create an account, please ignore this email.\n"
        );

        self.send(to_email, "Verify Your Email - ExamPort", html, text)
            .await?;
        log::info!("Verification email sent to: {}", to_email);
        Ok(())
    }

    async fn send_password_reset_link(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), MailerError> {
        let url = self.link("reset-password", token);
        let html = format!(
            "<p>We received a request to reset the password for your ExamPort account.</p>\
             <p><a href=\"{url}\">Reset Password</a></p>\
             <p>If the link doesn't work, copy and paste it into your browser:<br>{url}</p>\
             <p>This password reset link will expire in 30 minutes.</p>\
             <p>If you didn't request a password reset, please ignore this email. \
             Your password will remain unchanged.</p>"
        );
        let text = format!(
            "We received a request to reset the password for your ExamPort account.\n\n\
             Open this link to choose a new password:\n{url}\n\n\
             This password reset link will expire in 30 minutes.\n\
             If you didn't request a password reset, please ignore this email.\n"
        );

        self.send(to_email, "Reset Your Password - ExamPort", html, text)
            .await?;
        log::info!("Password reset email sent to: {}", to_email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            api_key: "key".to_string(),
            sender_email: "noreply@examport.test".to_string(),
            sender_name: Some("ExamPort".to_string()),
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            frontend_base_url: "https://app.examport.test/".to_string(),
        }
    }

    #[test]
    fn new_rejects_missing_api_key() {
        let config = EmailConfig {
            api_key: "  ".to_string(),
            ..test_config()
        };
        assert!(matches!(
            BrevoMailer::new(&config),
            Err(MailerError::Configuration(_))
        ));
    }

    #[test]
    fn links_are_rooted_and_escaped() {
        let mailer = BrevoMailer::new(&test_config()).expect("mailer");
        let url = mailer.link("reset-password", "abc/+def");
        assert_eq!(
            url,
            "https://app.examport.test/reset-password?token=abc%2F%2Bdef"
        );
    }

    #[test]
    fn payload_serializes_camel_case() {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: "noreply@examport.test".to_string(),
                name: None,
            },
            to: vec![BrevoEmailAddress {
                email: "user@example.com".to_string(),
                name: None,
            }],
            subject: "Subject".to_string(),
            html_content: Some("<p>hi</p>".to_string()),
            text_content: None,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("htmlContent").is_some());
        assert!(json.get("textContent").is_none());
    }
}
