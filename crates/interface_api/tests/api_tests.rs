//! HTTP tests for the payment plan API
//!
//! The router runs against the in-memory ledger and a recording notifier.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

use core_kernel::{FixedClock, InvoiceId, UserId};
use domain_billing::ports::mock::{InMemoryLedger, RecordingNotifier};
use domain_billing::{InstallmentStatus, NotificationEvent, Role};
use test_utils::{assert_single_notice, LedgerScenario};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

struct TestApp {
    router: Router,
    ledger: Arc<InMemoryLedger>,
    notifier: Arc<RecordingNotifier>,
    secret: String,
}

impl TestApp {
    async fn new() -> Self {
        let seeded = LedgerScenario::new().seed().await;
        let ledger = seeded.ledger;

        let notifier = Arc::new(RecordingNotifier::new());
        let config = ApiConfig::default();
        let secret = config.auth.jwt_secret.clone();
        let state = AppState::new(
            config,
            ledger.clone(),
            notifier.clone(),
            Arc::new(FixedClock::new(at(2025, 1, 15))),
        );

        Self {
            router: create_router(state),
            ledger,
            notifier,
            secret,
        }
    }

    fn token(&self, user: i64, role: Role) -> String {
        create_token(UserId::new(user), role, &self.secret, 300).unwrap()
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

// ============================================================================
// Authentication
// ============================================================================

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_adapters() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans?invoiceId=7", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let app = TestApp::new().await;
        let forged = create_token(UserId::new(1), Role::Owner, "not-the-secret", 300).unwrap();
        let (status, _) = app
            .send(Method::GET, "/api/v1/payment-plans?invoiceId=7", Some(&forged), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Payment plans
// ============================================================================

mod payment_plan_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_creates_installment() {
        let app = TestApp::new().await;
        let token = app.token(1, Role::Admin);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/payment-plans",
                Some(&token),
                Some(json!({"invoiceId": 7, "dueDate": "2025-02-01T00:00:00Z", "amount": 5000})),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["invoiceId"], 7);
        assert_eq!(body["amount"], 5000);
        assert_eq!(body["status"], "pending");

        let sent = app.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, NotificationEvent::New);
        assert_eq!(app.ledger.audit_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_member_cannot_create() {
        let app = TestApp::new().await;
        let token = app.token(3, Role::Member);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/payment-plans",
                Some(&token),
                Some(json!({"invoiceId": 7, "dueDate": "2025-02-01T00:00:00Z", "amount": 5000})),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
        assert!(app.ledger.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_takes_precedence_over_bad_body() {
        let app = TestApp::new().await;
        let token = app.token(4, Role::Client);

        let (status, _) = app
            .send(Method::POST, "/api/v1/payment-plans", Some(&token), Some(json!({"amount": -1})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_missing_fields_is_bad_request() {
        let app = TestApp::new().await;
        let token = app.token(1, Role::Admin);

        let (status, body) = app
            .send(Method::POST, "/api/v1/payment-plans", Some(&token), Some(json!({"invoiceId": 7})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = app
            .send(
                Method::POST,
                "/api/v1/payment-plans",
                Some(&token),
                Some(json!({"invoiceId": 7, "dueDate": "2025-02-01T00:00:00Z", "amount": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_for_unknown_invoice_is_not_found() {
        let app = TestApp::new().await;
        let token = app.token(1, Role::Owner);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/v1/payment-plans",
                Some(&token),
                Some(json!({"invoiceId": 99, "dueDate": "2025-02-01T00:00:00Z", "amount": 100})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_requires_invoice_id() {
        let app = TestApp::new().await;
        let token = app.token(3, Role::Member);

        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing invoiceId");
    }

    #[tokio::test]
    async fn test_list_reconciles_against_payments() {
        let app = TestApp::new().await;
        let invoice = InvoiceId::new(7);
        app.ledger
            .seed_installment(invoice, at(2025, 1, 10), 5000, InstallmentStatus::Pending)
            .await;
        app.ledger
            .seed_installment(invoice, at(2025, 1, 20), 5000, InstallmentStatus::Pending)
            .await;
        app.ledger.seed_payment(invoice, 5000, at(2025, 1, 5)).await;

        let token = app.token(4, Role::Client);
        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans?invoiceId=7", Some(&token), None)
            .await;

        assert_eq!(status, StatusCode::OK);
        let plans = body.as_array().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0]["status"], "paid");
        assert_eq!(plans[1]["status"], "pending");
    }

    #[tokio::test]
    async fn test_update_and_audit_log() {
        let app = TestApp::new().await;
        let seeded = app
            .ledger
            .seed_installment(InvoiceId::new(7), at(2025, 2, 1), 5000, InstallmentStatus::Pending)
            .await;
        let token = app.token(1, Role::Admin);

        let (status, body) = app
            .send(
                Method::PATCH,
                &format!("/api/v1/payment-plans/{}", seeded.id.value()),
                Some(&token),
                Some(json!({"status": "paid"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "paid");

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/api/v1/payment-plans/{}/logs", seeded.id.value()),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let logs = body.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "edit");
        assert_eq!(logs[0]["before"]["status"], "pending");
        assert_eq!(logs[0]["after"]["status"], "paid");
        assert_eq!(logs[0]["userName"], "Ada Admin");
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let app = TestApp::new().await;
        let token = app.token(1, Role::Admin);

        let (status, _) = app
            .send(
                Method::PATCH,
                "/api/v1/payment-plans/404",
                Some(&token),
                Some(json!({"amount": 100})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_bad_request() {
        let app = TestApp::new().await;
        let token = app.token(1, Role::Admin);

        let (status, body) = app
            .send(
                Method::PATCH,
                "/api/v1/payment-plans/abc",
                Some(&token),
                Some(json!({"amount": 100})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans/abc/logs", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_non_numeric_invoice_id_is_json_bad_request() {
        let app = TestApp::new().await;
        let token = app.token(3, Role::Member);

        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans?invoiceId=seven", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_delete_keeps_audit_trail() {
        let app = TestApp::new().await;
        let seeded = app
            .ledger
            .seed_installment(InvoiceId::new(7), at(2025, 2, 1), 5000, InstallmentStatus::Pending)
            .await;
        let token = app.token(2, Role::Owner);
        let path = format!("/api/v1/payment-plans/{}", seeded.id.value());

        let (status, body) = app.send(Method::DELETE, &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(app.ledger.installment(seeded.id).await.is_none());
        assert!(app.notifier.sent().await.is_empty());

        let (status, body) = app
            .send(Method::GET, &format!("{}/logs", path), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["action"], "delete");
        assert!(body[0]["after"].is_null());
    }

    #[tokio::test]
    async fn test_list_all_is_admin_only() {
        let app = TestApp::new().await;
        app.ledger
            .seed_installment(InvoiceId::new(7), at(2025, 2, 1), 5000, InstallmentStatus::Pending)
            .await;

        let (status, _) = app
            .send(Method::GET, "/api/v1/payment-plans/all", Some(&app.token(3, Role::Member)), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(Method::GET, "/api/v1/payment-plans/all", Some(&app.token(1, Role::Admin)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["clientName"], "Globex");
    }

    #[tokio::test]
    async fn test_reconcile_endpoint_marks_overdue_and_notifies() {
        let app = TestApp::new().await;
        app.ledger
            .seed_installment(InvoiceId::new(7), at(2025, 1, 10), 5000, InstallmentStatus::Pending)
            .await;
        let token = app.token(1, Role::Admin);

        let (status, body) = app
            .send(Method::POST, "/api/v1/payment-plans/reconcile?invoiceId=7", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changes"][0]["to"], "overdue");
        assert_eq!(body["noticesSent"], 1);

        let sent = app.notifier.sent().await;
        assert_single_notice(&sent, NotificationEvent::Overdue, "accounts@globex.test");
        assert_eq!(sent[0].payment_link.as_deref(), Some("https://pay.example/inv-7"));
    }
}

// ============================================================================
// Payments
// ============================================================================

mod payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_then_list_payments() {
        let app = TestApp::new().await;
        let token = app.token(3, Role::Member);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/payments",
                Some(&token),
                Some(json!({"invoiceId": 7, "amount": 2500, "method": "card"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["amount"], 2500);

        let (status, body) = app
            .send(Method::GET, "/api/v1/payments?invoiceId=7", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["method"], "card");
    }

    #[tokio::test]
    async fn test_payment_amount_must_be_positive() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/payments",
                Some(&app.token(1, Role::Admin)),
                Some(json!({"invoiceId": 7, "amount": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_payment_for_unknown_invoice() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send(
                Method::GET,
                "/api/v1/payments?invoiceId=123",
                Some(&app.token(1, Role::Admin)),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
