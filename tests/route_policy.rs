// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use common::{TEST_PASSWORD, TestHarness, build_test_app};
use serde_json::{Value, json};

/// Registers an account with the given role and returns a session token.
async fn login_as(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
    >,
    username: &str,
    role: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": TEST_PASSWORD,
            "role": role,
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": username, "password": TEST_PASSWORD}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    body["token"].as_str().expect("token").to_string()
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn anonymous_request_to_protected_route_gets_401() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    for uri in ["/api/users/me", "/api/exams"] {
        let resp =
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[actix_web::test]
async fn garbage_bearer_token_gets_401() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn public_routes_need_no_token() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/courses/public").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/contact")
            .set_json(json!({"message": "hello"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn options_requests_pass_without_token() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::with_uri("/api/users/me")
        .method(actix_web::http::Method::OPTIONS)
        .to_request();
    let resp = test::call_service(&app, req).await;
    // Policy admits the preflight; no OPTIONS handler is registered
    assert_ne!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn student_cannot_create_courses() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    let token = login_as(&app, "stu", "student").await;

    let req = test::TestRequest::post()
        .uri("/api/courses/create")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Algebra"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Forbidden");
}

#[actix_web::test]
async fn instructor_can_create_courses() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    let token = login_as(&app, "prof", "instructor").await;

    let req = test::TestRequest::post()
        .uri("/api/courses/create")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Algebra"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn admin_can_create_courses() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    let token = login_as(&app, "root", "admin").await;

    let req = test::TestRequest::post()
        .uri("/api/courses/create")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Algebra"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn authenticated_route_admits_any_role() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    let token = login_as(&app, "stu2", "student").await;

    let req = test::TestRequest::get()
        .uri("/api/exams")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "stu2");
    assert_eq!(body["role"], "student");
}

#[actix_web::test]
async fn auth_prefix_is_exact_not_loose() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    // A path that merely starts with "/api/auth" (no slash) is not public
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/authx/thing").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
