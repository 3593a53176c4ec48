// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::AuthRequest;
use crate::roles::Role;
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use std::future::{Ready, ready};

/// Access requirement for a route. Evaluated after authentication has run,
/// so the decision only looks at what the request already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredAccess {
    Public,
    Authenticated,
    AnyRole(&'static [Role]),
}

const COURSE_AUTHORS: &[Role] = &[Role::Admin, Role::Instructor];

enum PathPattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathPattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == *exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix),
        }
    }
}

/// One row of the route policy table. `method: None` matches any method.
struct PolicyRule {
    method: Option<Method>,
    pattern: PathPattern,
    access: RequiredAccess,
}

static POLICY: &[PolicyRule] = &[
    PolicyRule {
        method: None,
        pattern: PathPattern::Prefix("/api/auth/"),
        access: RequiredAccess::Public,
    },
    PolicyRule {
        method: Some(Method::GET),
        pattern: PathPattern::Exact("/health"),
        access: RequiredAccess::Public,
    },
    PolicyRule {
        method: Some(Method::GET),
        pattern: PathPattern::Exact("/api/courses/public"),
        access: RequiredAccess::Public,
    },
    PolicyRule {
        method: Some(Method::POST),
        pattern: PathPattern::Exact("/api/contact"),
        access: RequiredAccess::Public,
    },
    PolicyRule {
        method: Some(Method::POST),
        pattern: PathPattern::Exact("/api/courses/create"),
        access: RequiredAccess::AnyRole(COURSE_AUTHORS),
    },
];

/// Look up the access requirement for a request. First matching rule wins;
/// unmatched requests require authentication, so a forgotten route fails
/// closed.
pub fn required_access(method: &Method, path: &str) -> RequiredAccess {
    // CORS preflight never carries credentials
    if method == Method::OPTIONS {
        return RequiredAccess::Public;
    }

    POLICY
        .iter()
        .find(|rule| {
            rule.method
                .as_ref()
                .map_or(true, |rule_method| rule_method == method)
                && rule.pattern.matches(path)
        })
        .map(|rule| rule.access)
        .unwrap_or(RequiredAccess::Authenticated)
}

/// Middleware that enforces the route policy: 401 for anonymous requests to
/// protected routes, 403 for authenticated callers without a required role.
pub struct PolicyEnforcementMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for PolicyEnforcementMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PolicyEnforcementMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PolicyEnforcementMiddleware { service }))
    }
}

pub struct PolicyEnforcementMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PolicyEnforcementMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let access = required_access(req.method(), req.path());

        let denial = match access {
            RequiredAccess::Public => None,
            RequiredAccess::Authenticated => {
                if req.request().is_authenticated() {
                    None
                } else {
                    Some(HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"})))
                }
            }
            RequiredAccess::AnyRole(roles) => match req.request().identity() {
                None => Some(HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}))),
                Some(identity) if !roles.contains(&identity.role) => {
                    log::debug!(
                        "Denied {} {} for {} (role {})",
                        req.method(),
                        req.path(),
                        identity.username,
                        identity.role
                    );
                    Some(HttpResponse::Forbidden().json(json!({"error": "Forbidden"})))
                }
                Some(_) => None,
            },
        };

        if let Some(response) = denial {
            let (req, _) = req.into_parts();
            let response = response.map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(req, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
