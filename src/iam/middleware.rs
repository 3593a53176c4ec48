// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpRequest};
use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc; // Services are per-thread

use super::jwt::Claims;
use crate::auth::AuthService;
use crate::roles::Role;

/// The authenticated caller, attached to the request once the bearer token
/// has been verified.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

/// Trait to add authentication methods to HttpRequest
pub trait AuthRequest {
    fn identity(&self) -> Option<Identity>;
    fn jwt_claims(&self) -> Option<Claims>;
    fn has_role(&self, role: Role) -> bool;

    fn is_authenticated(&self) -> bool;
}

impl AuthRequest for HttpRequest {
    fn identity(&self) -> Option<Identity> {
        self.extensions().get::<Identity>().cloned()
    }

    fn jwt_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }

    fn has_role(&self, role: Role) -> bool {
        self.identity()
            .map(|identity| identity.role == role)
            .unwrap_or(false)
    }

    fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header_value = req.headers().get(header::AUTHORIZATION)?;
    let value = header_value.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// Bearer token authentication middleware. Attaches an Identity when the
// Authorization header carries a valid session token; never rejects on its
// own, the policy layer decides whether anonymous access is allowed.
pub struct BearerAuthMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_service_data = req.app_data::<Data<AuthService>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(auth_service) = auth_service_data {
                if let Some(token) = bearer_token(&req) {
                    match auth_service.get_ref().validate_session(&token) {
                        Ok(Some((claims, identity))) => {
                            req.extensions_mut().insert(claims);
                            req.extensions_mut().insert(identity);
                        }
                        Ok(None) => {
                            log::debug!("Rejected bearer token on {}", req.path());
                        }
                        Err(err) => {
                            log::error!("Session validation failed on {}: {}", req.path(), err);
                        }
                    }
                }
            }

            service.call(req).await
        })
    }
}
