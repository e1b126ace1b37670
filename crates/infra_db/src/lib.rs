//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL persistence for the payment plan service
//! using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `repositories` hold the SQL and
//! row types, `adapters` implement the domain's `LedgerPort` on top of them.
//! Installment writes made on behalf of a user run in one transaction with
//! their audit log entry.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/payplan")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PostgresLedgerAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresLedgerAdapter;
