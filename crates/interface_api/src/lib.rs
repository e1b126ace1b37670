//! HTTP API Layer
//!
//! This crate provides the REST API for installment payment plans using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for payment plans, payments and health
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Handlers only translate HTTP to calls on
//! [`domain_billing::PaymentPlanService`]; role checks and validation live in
//! the domain.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(config, ledger, notifier, Arc::new(SystemClock));
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::Clock;
use domain_billing::{LedgerPort, NotificationPort, PaymentPlanService};

use crate::config::ApiConfig;
use crate::handlers::{health, payment_plans, payments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub service: Arc<PaymentPlanService>,
    pub ledger: Arc<dyn LedgerPort>,
    pub notifier: Arc<dyn NotificationPort>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        ledger: Arc<dyn LedgerPort>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service = PaymentPlanService::new(ledger.clone(), notifier.clone(), clock)
            .with_read_policy(config.plans.read_policy);
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            ledger,
            notifier,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let plan_routes = Router::new()
        .route("/", get(payment_plans::list_plans).post(payment_plans::create_plan))
        .route("/all", get(payment_plans::list_all_plans))
        .route("/reconcile", post(payment_plans::reconcile))
        .route(
            "/:id",
            patch(payment_plans::update_plan).delete(payment_plans::delete_plan),
        )
        .route("/:id/logs", get(payment_plans::list_logs));

    let payment_routes = Router::new()
        .route("/", get(payments::list_payments).post(payments::record_payment));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/payment-plans", plan_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
