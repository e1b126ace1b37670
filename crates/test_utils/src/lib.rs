//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! payment plan test suites.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for invoices, clients and callers
//! - `builders`: Builders for installments, payments and seeded ledgers
//! - `assertions`: Assertion helpers for schedules, audit entries and notices
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
