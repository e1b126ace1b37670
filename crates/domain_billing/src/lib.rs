//! Billing Domain - Installment Payment Plans
//!
//! This crate holds the payment plan engine: invoices are split into
//! installments, payments against an invoice are pooled, and the pool is
//! spent across the schedule in due-date order to decide which installments
//! are paid, pending or overdue.
//!
//! # Components
//!
//! - **Ports**: [`LedgerPort`] for storage and [`NotificationPort`] for client notices
//! - **Reconciliation**: [`ReconciliationEngine`] applies a pure
//!   [`plan_reconciliation`] step to the ledger
//! - **Service**: [`PaymentPlanService`] gates schedule edits by role and
//!   writes an audit entry for each one
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentPlanService, ReadPolicy};
//!
//! let service = PaymentPlanService::new(ledger, notifier, clock)
//!     .with_read_policy(ReadPolicy::ReconcileOnRead);
//!
//! // Reconciles, then returns the schedule
//! let schedule = service.list(&caller, invoice_id).await?;
//! ```

pub mod access;
pub mod audit;
pub mod error;
pub mod installment;
pub mod invoice;
pub mod notification;
pub mod payment;
pub mod ports;
pub mod reconciliation;
pub mod service;

pub use access::{Caller, Role};
pub use audit::{AuditAction, AuditLogEntry, AuditLogView, NewAuditEntry};
pub use error::PaymentPlanError;
pub use installment::{
    Installment, InstallmentChanges, InstallmentRevision, InstallmentStatus, InstallmentSummary,
    NewInstallment,
};
pub use invoice::{Client, Invoice, InvoiceStatus, InvoiceWithClient};
pub use notification::{InstallmentNotice, NotificationEvent};
pub use payment::{payment_pool, NewPayment, Payment};
pub use ports::{LedgerPort, NotificationPort};
pub use reconciliation::{
    plan_reconciliation, InvoiceLocks, ReconciliationEngine, ReconciliationPlan,
    ReconciliationReport, StatusTransition,
};
pub use service::{CreateInstallment, PaymentPlanService, ReadPolicy, RecordPayment, UpdateInstallment};
