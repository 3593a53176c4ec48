// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod handlers;
mod service;
pub mod types;

pub use service::{AuthService, RegisterOutcome, ResendOutcome};
pub use types::AuthError;

use actix_web::web;

/// Configure the authentication routes under /api/auth
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/verify-email", web::get().to(handlers::verify_email))
            .route(
                "/request-password-reset",
                web::post().to(handlers::request_password_reset),
            )
            .route("/reset-password", web::post().to(handlers::reset_password))
            .route(
                "/resend-verification",
                web::post().to(handlers::resend_verification),
            )
            .route("/health", web::get().to(handlers::health)),
    )
    .route("/health", web::get().to(handlers::health));
}
