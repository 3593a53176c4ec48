// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpRequest, HttpResponse, Result, web};
use async_trait::async_trait;
use examport::auth::{self, AuthService};
use examport::config::{
    AppConfig, EmailConfig, JwtConfig, LoggingConfig, PasswordHashingConfig, SecurityConfig,
    ServerConfig, StorageConfig, TokensConfig,
};
use examport::email::{MailerError, Notifier};
use examport::iam::{
    AuthRequest, BearerAuthMiddlewareFactory, DirectoryService, MemoryAccountStore,
};
use examport::security::PolicyEnforcementMiddlewareFactory;
use serde_json::json;
use std::sync::{Arc, Mutex};

pub const TEST_PASSWORD: &str = "orange-crate-42";

/// Mailer that records outbound tokens instead of sending anything.
#[derive(Default)]
pub struct RecordingMailer {
    pub verification: Mutex<Vec<(String, String)>>,
    pub reset: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_verification_token(&self) -> Option<String> {
        self.verification
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }

    pub fn last_reset_token(&self) -> Option<String> {
        self.reset
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Notifier for RecordingMailer {
    async fn send_verification_link(&self, to_email: &str, token: &str) -> Result<(), MailerError> {
        self.verification
            .lock()
            .unwrap()
            .push((to_email.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_password_reset_link(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), MailerError> {
        self.reset
            .lock()
            .unwrap()
            .push((to_email.to_string(), token.to_string()));
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        logging: LoggingConfig::default(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            issuer: "examport".to_string(),
            audience: "examport-users".to_string(),
            expiration_hours: 12,
        },
        tokens: TokensConfig::default(),
        email: EmailConfig::default(),
        security: SecurityConfig {
            min_password_chars: 6,
            // Cheap parameters keep the hashing in tests fast
            password_hashing: PasswordHashingConfig {
                memory_kib: 8192,
                iterations: 1,
                parallelism: 1,
            },
        },
        storage: StorageConfig::default(),
    }
}

pub struct TestHarness {
    pub auth_service: web::Data<AuthService>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryAccountStore::empty());
        let directory = DirectoryService::new(store).expect("directory service");
        let mailer = Arc::new(RecordingMailer::default());
        let auth_service =
            AuthService::new(&config, directory, mailer.clone()).expect("auth service");

        TestHarness {
            auth_service: web::Data::new(auth_service),
            mailer,
        }
    }
}

async fn stub_identity(req: HttpRequest) -> Result<HttpResponse> {
    let identity = req.identity().expect("admitted without identity");
    Ok(HttpResponse::Ok().json(json!({
        "username": identity.username,
        "role": identity.role,
    })))
}

async fn stub_ok() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Builds the app the way main() does, plus a few stub resource routes so
/// the route policy has something to protect.
pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(harness.auth_service.clone())
        .configure(auth::configure)
        .route("/api/users/me", web::get().to(stub_identity))
        .route("/api/courses/public", web::get().to(stub_ok))
        .route("/api/courses/create", web::post().to(stub_ok))
        .route("/api/exams", web::get().to(stub_ok))
        .route("/api/contact", web::post().to(stub_ok))
        .wrap(PolicyEnforcementMiddlewareFactory)
        .wrap(BearerAuthMiddlewareFactory)
}
