//! Payment Plan API Server Binary
//!
//! This binary starts the HTTP API server for installment payment plans.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin payplan-api
//!
//! # Run with environment variables
//! APP__SERVER__PORT=8080 APP__DATABASE__URL=postgres://... cargo run --bin payplan-api
//! ```
//!
//! # Environment Variables
//!
//! * `APP__SERVER__HOST` / `APP__SERVER__PORT` - Bind address (default: 0.0.0.0:8080)
//! * `APP__SERVER__LOG_LEVEL` - Log filter when `RUST_LOG` is unset (default: info)
//! * `APP__SERVER__JSON_LOGS` - Emit JSON log lines (default: false)
//! * `APP__AUTH__JWT_SECRET` - JWT signing secret (required in production)
//! * `APP__DATABASE__URL` - PostgreSQL connection string
//! * `APP__MAIL__ENABLED` - Deliver notices over SMTP instead of logging them
//! * `APP__MAIL__HOST`, `APP__MAIL__PORT`, `APP__MAIL__USER`, `APP__MAIL__PASSWORD`
//! * `APP__PLANS__READ_POLICY` - `reconcile_on_read` (default) or `observational`

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::SystemClock;
use infra_db::{create_pool, run_migrations, PostgresLedgerAdapter};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;

    init_tracing(&config.server.log_level, config.server.json_logs);

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        read_policy = ?config.plans.read_policy,
        mail_enabled = config.mail.enabled,
        "Starting payment plan API server"
    );

    let pool = create_pool(config.database.pool_config())
        .await
        .context("connecting to database")?;

    if config.database.run_migrations {
        run_migrations(&pool).await.context("applying migrations")?;
    }

    let ledger = Arc::new(PostgresLedgerAdapter::new(pool));
    let notifier = infra_mail::notifier_from_config(&config.mail).context("configuring mail")?;

    let addr: SocketAddr = config.server_addr().parse().context("parsing bind address")?;
    let state = AppState::new(config, ledger, notifier, Arc::new(SystemClock));
    let app = create_router(state);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests are allowed to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
