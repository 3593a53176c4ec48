// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::service::{AuthService, ResendOutcome};
use super::types::{
    AuthError, EmailRequest, LoginRequest, LoginResponse, OutcomeResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, VerifyEmailQuery,
};
use actix_web::{HttpResponse, Result, web};
use chrono::Utc;
use serde_json::json;

fn server_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({"error": message}))
}

pub(super) async fn register(
    payload: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let request = payload.into_inner();
    log::info!("Registration attempt for username: {}", request.username);

    match auth.register(request).await {
        Ok(outcome) => {
            let message = if outcome.verification_email_sent {
                "Registration successful! Please check your email to verify your account."
            } else {
                "Registration successful! However, verification email could not be sent."
            };
            let account = outcome.account;
            Ok(HttpResponse::Ok().json(RegisterResponse {
                username: account.username,
                role: account.role,
                full_name: account.full_name,
                avatar_url: account.avatar_url,
                gender: account.gender,
                phone_number: account.phone,
                email_verified: account.email_verified,
                verification_email_sent: outcome.verification_email_sent,
                message: message.to_string(),
            }))
        }
        Err(err @ (AuthError::UsernameTaken | AuthError::EmailTaken)) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": err.to_string()})))
        }
        Err(AuthError::Validation(message)) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": message})))
        }
        Err(err) => {
            log::error!("Error during user registration: {}", err);
            Ok(server_error("Registration failed due to server error"))
        }
    }
}

pub(super) async fn login(
    payload: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let request = payload.into_inner();
    log::info!("Login attempt for username: {}", request.username);

    match auth.login(&request.username, &request.password) {
        Ok((token, account)) => Ok(HttpResponse::Ok().json(LoginResponse {
            token,
            username: account.username,
            role: account.role,
            full_name: account.full_name,
            avatar_url: account.avatar_url,
            gender: account.gender,
            timestamp: Utc::now().timestamp_millis(),
        })),
        Err(AuthError::InvalidCredentials) => Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Invalid username or password",
            "timestamp": Utc::now().timestamp_millis(),
        }))),
        Err(err) => {
            log::error!("Error during login for username {}: {}", request.username, err);
            Ok(server_error("Login failed due to server error"))
        }
    }
}

pub(super) async fn verify_email(
    query: web::Query<VerifyEmailQuery>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    log::info!("Email verification attempt");

    match auth.verify_email(&query.token).await {
        Ok(true) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: true,
            message: "Email verified successfully! You can now log in to your account."
                .to_string(),
        })),
        Ok(false) => Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "Email verification failed. The token may be invalid or expired.".to_string(),
        })),
        Err(err) => {
            log::error!("Error during email verification: {}", err);
            Ok(HttpResponse::InternalServerError().json(OutcomeResponse {
                success: false,
                message: "Email verification failed due to server error".to_string(),
            }))
        }
    }
}

pub(super) async fn request_password_reset(
    payload: web::Json<EmailRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let email = payload.email.trim();
    log::info!("Password reset requested for email: {}", email);

    if email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "Email is required".to_string(),
        }));
    }

    match auth.request_password_reset(email).await {
        // Same response whether or not the account exists
        Ok(()) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: true,
            message: "If an account with this email exists, a password reset link has been sent."
                .to_string(),
        })),
        Err(err) => {
            log::error!("Error during password reset request for {}: {}", email, err);
            Ok(HttpResponse::InternalServerError().json(OutcomeResponse {
                success: false,
                message: "Password reset request failed due to server error".to_string(),
            }))
        }
    }
}

pub(super) async fn reset_password(
    payload: web::Json<ResetPasswordRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let request = payload.into_inner();
    log::info!("Password reset attempt");

    if request.token.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "Token is required".to_string(),
        }));
    }
    if request.new_password.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "New password is required".to_string(),
        }));
    }

    match auth.reset_password(&request.token, &request.new_password).await {
        Ok(true) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: true,
            message: "Password reset successfully! You can now log in with your new password."
                .to_string(),
        })),
        Ok(false) => Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "Password reset failed. The token may be invalid or expired.".to_string(),
        })),
        Err(AuthError::Validation(message)) => {
            Ok(HttpResponse::BadRequest().json(OutcomeResponse {
                success: false,
                message,
            }))
        }
        Err(err) => {
            log::error!("Error during password reset: {}", err);
            Ok(HttpResponse::InternalServerError().json(OutcomeResponse {
                success: false,
                message: "Password reset failed due to server error".to_string(),
            }))
        }
    }
}

pub(super) async fn resend_verification(
    payload: web::Json<EmailRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let email = payload.email.trim();
    log::info!("Resend verification requested for email: {}", email);

    if email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "Email is required".to_string(),
        }));
    }

    match auth.resend_verification(email).await {
        Ok(ResendOutcome::NoAccount) => Ok(HttpResponse::BadRequest().json(OutcomeResponse {
            success: false,
            message: "No account found with this email address".to_string(),
        })),
        Ok(ResendOutcome::AlreadyVerified) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: true,
            message: "Email is already verified".to_string(),
        })),
        Ok(ResendOutcome::Sent) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: true,
            message: "Verification email sent successfully! Please check your inbox.".to_string(),
        })),
        Ok(ResendOutcome::SendFailed) => Ok(HttpResponse::Ok().json(OutcomeResponse {
            success: false,
            message: "Failed to send verification email. Please try again later.".to_string(),
        })),
        Err(err) => {
            log::error!("Error during resend verification for {}: {}", email, err);
            Ok(HttpResponse::InternalServerError().json(OutcomeResponse {
                success: false,
                message: "Resend verification failed due to server error".to_string(),
            }))
        }
    }
}

pub(super) async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": Utc::now().timestamp_millis(),
        "message": "Auth service is running",
    })))
}
