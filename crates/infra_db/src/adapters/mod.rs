//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerAdapter;
//! use domain_billing::LedgerPort;
//!
//! let adapter = PostgresLedgerAdapter::new(pool);
//! let schedule = adapter.get_installments(invoice_id).await?;
//! ```

pub mod ledger;

pub use ledger::PostgresLedgerAdapter;
