//! Integration tests for the payment HTTP endpoints.
//!
//! Requests go through the full router (auth middleware included) with
//! mock gateway and in-memory stores behind it.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use course_payments::adapters::auth::MockSessionValidator;
use course_payments::adapters::http::{build_router, PaymentsAppState};
use course_payments::adapters::memory::{InMemoryCourseReader, InMemoryEnrollmentRepository};
use course_payments::adapters::stripe::MockPaymentGateway;
use course_payments::application::{EnrollmentCreator, PaymentService, WebhookDispatcher};
use course_payments::domain::course::Course;
use course_payments::domain::foundation::CourseId;
use course_payments::domain::payment::PaymentIntentStatus;

const TOKEN: &str = "token-user-1";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    gateway: MockPaymentGateway,
    repo: InMemoryEnrollmentRepository,
}

fn test_app() -> TestApp {
    let courses = InMemoryCourseReader::with_courses(vec![Course::new(
        CourseId::new("rust-300").unwrap(),
        "Systems Rust",
        Decimal::from_str("300.00").unwrap(),
    )
    .unwrap()]);
    let gateway = MockPaymentGateway::new();
    let repo = InMemoryEnrollmentRepository::new();
    let creator = Arc::new(EnrollmentCreator::new(Arc::new(repo.clone())));

    let state = PaymentsAppState {
        payment_service: Arc::new(PaymentService::new(
            Arc::new(courses),
            Arc::new(gateway.clone()),
            creator.clone(),
            "usd",
        )),
        webhook_dispatcher: Arc::new(WebhookDispatcher::new(
            Arc::new(gateway.clone()),
            creator,
            false,
        )),
        enrollment_repository: Arc::new(repo.clone()),
        expose_error_details: false,
    };
    let auth = Arc::new(MockSessionValidator::new().with_test_user(TOKEN, "user-1"));

    TestApp {
        router: build_router(state, auth),
        gateway,
        repo,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn initialize(app: &TestApp) -> String {
    let (status, body) = send_json(
        app,
        post_json(
            "/api/payments/course/initialize",
            json!({ "courseId": "rust-300", "enrollmentType": "FULL" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The mock derives client secrets from intent ids.
    let secret = body["clientSecret"].as_str().unwrap();
    secret.trim_end_matches("_secret_mock").to_string()
}

fn webhook(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

// =============================================================================
// Initialize
// =============================================================================

#[tokio::test]
async fn initialize_returns_client_secret_and_amount() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/payments/course/initialize",
            json!({ "courseId": "rust-300", "enrollmentType": "INSTALLMENT" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["clientSecret"], "pi_mock_1_secret_mock");
    assert_eq!(body["amount"], 110.0);
    assert_eq!(body["currency"], "usd");
}

#[tokio::test]
async fn initialize_unknown_course_is_bad_request() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/payments/course/initialize",
            json!({ "courseId": "missing", "enrollmentType": "FULL" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Course not found");
    assert_eq!(body["code"], "COURSE_NOT_FOUND");
}

#[tokio::test]
async fn initialize_rejects_malformed_body() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        post_json("/api/payments/course/initialize", json!({ "courseId": 7 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/course/initialize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "courseId": "rust-300", "enrollmentType": "FULL" }).to_string(),
        ))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.gateway.call_count("create_payment_intent"), 0);
}

// =============================================================================
// Confirm and Enrollment
// =============================================================================

#[tokio::test]
async fn confirm_succeeded_payment_enrolls_caller() {
    let app = test_app();
    let intent_id = initialize(&app).await;
    app.gateway
        .set_intent_status(&intent_id, PaymentIntentStatus::Succeeded);

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/payments/course/confirm",
            json!({ "paymentIntentId": intent_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment confirmed and enrollment created");
    assert_eq!(body["enrollmentDetails"]["courseId"], "rust-300");
    assert_eq!(body["enrollmentDetails"]["alreadyEnrolled"], false);
    assert_eq!(app.repo.count().await, 1);

    let (status, body) = send_json(&app, get("/api/payments/course/rust-300/enrollment")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "user-1");
    assert_eq!(body["enrollmentType"], "FULL");
    assert_eq!(body["paymentIntentId"], "pi_mock_1");
}

#[tokio::test]
async fn confirm_pending_payment_is_bad_request() {
    let app = test_app();
    let intent_id = initialize(&app).await;

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/payments/course/confirm",
            json!({ "paymentIntentId": intent_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment not completed");
    assert_eq!(app.repo.count().await, 0);
}

#[tokio::test]
async fn store_outage_is_internal_error_without_detail() {
    let app = test_app();
    let intent_id = initialize(&app).await;
    app.gateway
        .set_intent_status(&intent_id, PaymentIntentStatus::Succeeded);
    app.repo.set_unavailable(true);

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/payments/course/confirm",
            json!({ "paymentIntentId": intent_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn missing_enrollment_is_not_found() {
    let app = test_app();

    let (status, body) = send_json(&app, get("/api/payments/course/rust-300/enrollment")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENROLLMENT_NOT_FOUND");
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn webhook_acknowledges_and_enrolls() {
    let app = test_app();
    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "created": 1_704_067_200,
        "data": { "object": {
            "id": "pi_hook",
            "amount": 30000,
            "currency": "usd",
            "status": "succeeded",
            "metadata": { "userId": "user-9", "courseId": "rust-300", "enrollmentType": "FULL" }
        }}
    })
    .to_string();

    let (status, body) = send(&app, webhook(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Webhook received");

    let (status, _) = send(&app, webhook(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.repo.count().await, 1);
}

#[tokio::test]
async fn malformed_webhook_is_bad_request() {
    let app = test_app();

    let (status, body) = send(&app, webhook("not json".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"Webhook error");
}

#[tokio::test]
async fn health_check_responds_ok() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
