//! API integration tests.
//!
//! These tests verify router wiring and the authentication boundary using
//! a mock database; full end-to-end flows run against a live database in
//! `academy-db`'s integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use academy_api::{middleware::AppState, router as api_router};
use academy_common::PaymentConfig;
use academy_core::{
    ActivityLogService, AssignmentService, LifecycleService, NoopProvider, PaymentService,
    PricingEngine, PricingService, StatsService, UserService,
};
use academy_db::repositories::{
    ActivityLogRepository, AssignmentRepository, PaymentRepository, PricingRuleRepository,
    UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use tower::ServiceExt;

/// Create a mock database connection.
fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

/// Create test app state with mock database and unconfigured provider.
fn create_test_state() -> AppState {
    let db = Arc::new(create_mock_db());

    let user_repo = UserRepository::new(Arc::clone(&db));
    let assignment_repo = AssignmentRepository::new(Arc::clone(&db));
    let payment_repo = PaymentRepository::new(Arc::clone(&db));
    let activity_log_repo = ActivityLogRepository::new(Arc::clone(&db));
    let pricing_rule_repo = PricingRuleRepository::new(Arc::clone(&db));

    let activity_log_service = ActivityLogService::new(activity_log_repo);
    let user_service = UserService::new(user_repo.clone(), activity_log_service.clone());
    let lifecycle_service = LifecycleService::new(
        assignment_repo.clone(),
        payment_repo.clone(),
        activity_log_service.clone(),
    );
    let pricing_service = PricingService::new(
        pricing_rule_repo,
        PricingEngine::new("GBP".to_string()),
    );
    let assignment_service = AssignmentService::new(
        assignment_repo.clone(),
        user_repo.clone(),
        lifecycle_service.clone(),
        pricing_service,
        activity_log_service.clone(),
    );
    let payment_service = PaymentService::new(
        payment_repo.clone(),
        assignment_repo.clone(),
        lifecycle_service.clone(),
        activity_log_service.clone(),
        Arc::new(NoopProvider),
        PaymentConfig::default(),
    );
    let stats_service = StatsService::new(user_repo, assignment_repo, payment_repo);

    AppState {
        user_service,
        assignment_service,
        lifecycle_service,
        payment_service,
        activity_log_service,
        stats_service,
    }
}

/// Create the test router. No auth middleware is layered, so requests
/// carry no user and every `AuthUser` endpoint must reject.
fn create_test_router() -> Router {
    let state = create_test_state();
    api_router().with_state(state)
}

async fn post(app: Router, uri: &str, body: &str) -> StatusCode {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_assignments_require_auth() {
    assert_eq!(
        post(create_test_router(), "/assignments", "{}").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_analyze_requires_auth() {
    assert_eq!(
        post(
            create_test_router(),
            "/assignments/analyze",
            r#"{"assignmentId":"a1"}"#,
        )
        .await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_payment_endpoints_require_auth() {
    for (uri, body) in [
        (
            "/payments/initiate",
            r#"{"assignmentId":"a1","amount":24.0}"#,
        ),
        ("/payments/verify", r#"{"txRef":"ACA-x"}"#),
        ("/payments/poll", r#"{"txRef":"ACA-x"}"#),
        ("/payments/quote", r#"{"amount":100.0}"#),
    ] {
        assert_eq!(
            post(create_test_router(), uri, body).await,
            StatusCode::UNAUTHORIZED,
            "{uri} should require auth"
        );
    }
}

#[tokio::test]
async fn test_admin_endpoints_require_auth() {
    for (uri, body) in [
        ("/admin/stats", "{}"),
        ("/admin/assignments", "{}"),
        ("/admin/users", "{}"),
        ("/admin/payments", "{}"),
        ("/admin/logs", "{}"),
        (
            "/admin/update-status",
            r#"{"assignmentId":"a1","status":"completed"}"#,
        ),
    ] {
        assert_eq!(
            post(create_test_router(), uri, body).await,
            StatusCode::UNAUTHORIZED,
            "{uri} should require auth"
        );
    }
}

#[tokio::test]
async fn test_update_status_rejects_unknown_status() {
    // The status enumeration is closed; deserialization fails before any
    // handler logic, regardless of authentication
    let status = post(
        create_test_router(),
        "/admin/update-status",
        r#"{"assignmentId":"a1","status":"archived"}"#,
    )
    .await;

    assert!(
        status == StatusCode::UNPROCESSABLE_ENTITY
            || status == StatusCode::BAD_REQUEST
            || status == StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_register_validates_input() {
    // Invalid email fails validation before touching the database
    let status = post(
        create_test_router(),
        "/users/register",
        r#"{"name":"Alice","email":"not-an-email"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    assert_eq!(
        post(create_test_router(), "/does-not-exist", "{}").await,
        StatusCode::NOT_FOUND
    );
}
