//! Core Kernel - Foundational types shared by the payment plan service
//!
//! This crate provides the building blocks used by every other crate:
//! - Strongly typed identifiers for invoices, installments, payments and users
//! - Money expressed in integer minor units (cents)
//! - A clock abstraction so "now" can be injected
//! - The port error type and marker traits for hexagonal adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MinorUnits, Currency, MoneyError};
pub use temporal::{Clock, SystemClock, FixedClock};
pub use identifiers::{
    InvoiceId, ClientId, PaymentId, InstallmentId, UserId, AuditEntryId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
