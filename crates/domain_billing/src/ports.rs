//! Billing Domain Ports
//!
//! Port interfaces the payment plan engine needs from the outside world.
//!
//! # Architecture
//!
//! - [`LedgerPort`] reads invoices, payments and installments and writes
//!   installment rows together with their audit entries.
//! - [`NotificationPort`] delivers installment notices to clients.
//!
//! Adapters:
//!
//! - **PostgreSQL**: `infra_db::adapters::PostgresLedgerAdapter`
//! - **SMTP / log**: `infra_mail::SmtpNotifier`, `infra_mail::LogNotifier`
//! - **Mock**: [`mock::InMemoryLedger`] and [`mock::RecordingNotifier`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_billing::ports::{LedgerPort, NotificationPort};
//! use std::sync::Arc;
//!
//! let ledger: Arc<dyn LedgerPort> = Arc::new(PostgresLedgerAdapter::new(pool));
//! let notifier: Arc<dyn NotificationPort> = Arc::new(LogNotifier::new());
//! let engine = ReconciliationEngine::new(ledger, notifier, Arc::new(SystemClock));
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, HealthCheckable, InstallmentId, InvoiceId, PortError, UserId};

use crate::audit::AuditLogView;
use crate::installment::{
    Installment, InstallmentChanges, InstallmentRevision, InstallmentStatus, InstallmentSummary,
    NewInstallment,
};
use crate::invoice::InvoiceWithClient;
use crate::notification::InstallmentNotice;
use crate::payment::{NewPayment, Payment};

/// Ledger accessors
///
/// Every method that changes an installment on behalf of a user takes the
/// actor and timestamp and writes the matching audit entry in the same unit
/// of work. If the audit entry cannot be written the change is not applied.
#[async_trait]
pub trait LedgerPort: DomainPort + HealthCheckable {
    /// Loads an invoice and, when it still exists, its client
    async fn get_invoice_with_client(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Option<InvoiceWithClient>, PortError>;

    /// Installments of an invoice, ordered by due date then id
    async fn get_installments(&self, invoice_id: InvoiceId) -> Result<Vec<Installment>, PortError>;

    async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>, PortError>;

    /// Every installment across all invoices, with the client name
    async fn list_all_installments(&self) -> Result<Vec<InstallmentSummary>, PortError>;

    /// Payments of an invoice, ordered by date then id
    async fn get_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError>;

    async fn record_payment(
        &self,
        payment: NewPayment,
        received_at: DateTime<Utc>,
    ) -> Result<Payment, PortError>;

    /// Writes a status change made by reconciliation. Not audited.
    async fn save_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<(), PortError>;

    /// Inserts a pending installment and its `add` audit entry
    async fn insert_installment(
        &self,
        installment: NewInstallment,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Installment, PortError>;

    /// Applies an edit and writes its `edit` audit entry
    ///
    /// Fails with `PortError::NotFound` when the installment does not exist.
    async fn update_installment(
        &self,
        id: InstallmentId,
        changes: &InstallmentChanges,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<InstallmentRevision, PortError>;

    /// Deletes an installment and writes its `delete` audit entry
    ///
    /// Returns the row as it was before deletion.
    async fn delete_installment(
        &self,
        id: InstallmentId,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Installment, PortError>;

    /// Audit entries of an installment, oldest first
    async fn get_audit_log(&self, installment_id: InstallmentId) -> Result<Vec<AuditLogView>, PortError>;
}

/// Notification gateway
#[async_trait]
pub trait NotificationPort: DomainPort + HealthCheckable {
    async fn notify(&self, notice: &InstallmentNotice) -> Result<(), PortError>;
}

/// In-memory adapters for testing
///
/// These keep all state behind a single lock so that an installment change
/// and its audit entry are applied together or not at all, matching the
/// transactional PostgreSQL adapter.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, AuditEntryId, ClientId, HealthCheckResult, MinorUnits, PaymentId};

    use crate::audit::{AuditLogEntry, NewAuditEntry};
    use crate::invoice::{Client, Invoice};

    #[derive(Debug, Default)]
    struct LedgerState {
        invoices: HashMap<InvoiceId, Invoice>,
        clients: HashMap<ClientId, Client>,
        users: HashMap<UserId, (String, String)>,
        installments: BTreeMap<InstallmentId, Installment>,
        payments: Vec<Payment>,
        audit: Vec<AuditLogEntry>,
        next_installment: i64,
        next_payment: i64,
        next_audit: i64,
    }

    impl LedgerState {
        fn next_installment_id(&mut self) -> InstallmentId {
            self.next_installment += 1;
            InstallmentId::new(self.next_installment)
        }

        fn next_payment_id(&mut self) -> PaymentId {
            self.next_payment += 1;
            PaymentId::new(self.next_payment)
        }

        fn append_audit(&mut self, entry: NewAuditEntry) {
            self.next_audit += 1;
            let id = AuditEntryId::new(self.next_audit);
            self.audit.push(entry.into_entry(id));
        }
    }

    /// In-memory ledger
    #[derive(Debug, Default)]
    pub struct InMemoryLedger {
        state: RwLock<LedgerState>,
        status_writes: AtomicUsize,
        fail_audit: AtomicBool,
        fail_reads: AtomicBool,
    }

    impl InMemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Stores an invoice and, optionally, the client it is billed to
        pub async fn insert_invoice(&self, invoice: Invoice, client: Option<Client>) {
            let mut state = self.state.write().await;
            if let Some(client) = client {
                state.clients.insert(client.id, client);
            }
            state.invoices.insert(invoice.id, invoice);
        }

        /// Registers a user so audit views can show their name and email
        pub async fn insert_user(&self, id: UserId, name: impl Into<String>, email: impl Into<String>) {
            self.state
                .write()
                .await
                .users
                .insert(id, (name.into(), email.into()));
        }

        /// Stores an installment as-is, bypassing the audit trail
        pub async fn seed_installment(
            &self,
            invoice_id: InvoiceId,
            due_date: DateTime<Utc>,
            amount: i64,
            status: InstallmentStatus,
        ) -> Installment {
            let mut state = self.state.write().await;
            let installment = Installment {
                id: state.next_installment_id(),
                invoice_id,
                due_date,
                amount: MinorUnits::new(amount),
                status,
            };
            state.installments.insert(installment.id, installment.clone());
            installment
        }

        /// Stores a payment received at `date`
        pub async fn seed_payment(&self, invoice_id: InvoiceId, amount: i64, date: DateTime<Utc>) -> Payment {
            let mut state = self.state.write().await;
            let payment = Payment {
                id: state.next_payment_id(),
                invoice_id,
                amount: MinorUnits::new(amount),
                date,
                method: None,
                note: None,
            };
            state.payments.push(payment.clone());
            payment
        }

        /// Current stored state of an installment
        pub async fn installment(&self, id: InstallmentId) -> Option<Installment> {
            self.state.read().await.installments.get(&id).cloned()
        }

        /// Every audit entry written so far, in write order
        pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
            self.state.read().await.audit.clone()
        }

        /// Number of status writes made through `save_installment_status`
        pub fn status_writes(&self) -> usize {
            self.status_writes.load(Ordering::SeqCst)
        }

        /// Makes every audited mutation fail without applying its change
        pub fn fail_audit_writes(&self, fail: bool) {
            self.fail_audit.store(fail, Ordering::SeqCst);
        }

        /// Makes installment and payment reads fail
        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn check_reads(&self) -> Result<(), PortError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory ledger configured to fail reads"));
            }
            Ok(())
        }

        fn check_audit(&self) -> Result<(), PortError> {
            if self.fail_audit.load(Ordering::SeqCst) {
                return Err(PortError::internal("audit log write rejected"));
            }
            Ok(())
        }
    }

    impl DomainPort for InMemoryLedger {}

    #[async_trait]
    impl HealthCheckable for InMemoryLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-ledger".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LedgerPort for InMemoryLedger {
        async fn get_invoice_with_client(
            &self,
            invoice_id: InvoiceId,
        ) -> Result<Option<InvoiceWithClient>, PortError> {
            self.check_reads()?;
            let state = self.state.read().await;
            Ok(state.invoices.get(&invoice_id).map(|invoice| InvoiceWithClient {
                invoice: invoice.clone(),
                client: state.clients.get(&invoice.client_id).cloned(),
            }))
        }

        async fn get_installments(&self, invoice_id: InvoiceId) -> Result<Vec<Installment>, PortError> {
            self.check_reads()?;
            let state = self.state.read().await;
            let mut rows: Vec<Installment> = state
                .installments
                .values()
                .filter(|i| i.invoice_id == invoice_id)
                .cloned()
                .collect();
            rows.sort_by_key(|i| (i.due_date, i.id));
            Ok(rows)
        }

        async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>, PortError> {
            self.check_reads()?;
            Ok(self.state.read().await.installments.get(&id).cloned())
        }

        async fn list_all_installments(&self) -> Result<Vec<InstallmentSummary>, PortError> {
            self.check_reads()?;
            let state = self.state.read().await;
            let mut rows: Vec<InstallmentSummary> = state
                .installments
                .values()
                .map(|i| InstallmentSummary {
                    id: i.id,
                    invoice_id: i.invoice_id,
                    due_date: i.due_date,
                    amount: i.amount,
                    status: i.status,
                    client_name: state
                        .invoices
                        .get(&i.invoice_id)
                        .and_then(|inv| state.clients.get(&inv.client_id))
                        .map(|c| c.name.clone()),
                })
                .collect();
            rows.sort_by_key(|i| (i.due_date, i.id));
            Ok(rows)
        }

        async fn get_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
            self.check_reads()?;
            let state = self.state.read().await;
            let mut rows: Vec<Payment> = state
                .payments
                .iter()
                .filter(|p| p.invoice_id == invoice_id)
                .cloned()
                .collect();
            rows.sort_by_key(|p| (p.date, p.id));
            Ok(rows)
        }

        async fn record_payment(
            &self,
            payment: NewPayment,
            received_at: DateTime<Utc>,
        ) -> Result<Payment, PortError> {
            let mut state = self.state.write().await;
            if !state.invoices.contains_key(&payment.invoice_id) {
                return Err(PortError::not_found("Invoice", payment.invoice_id));
            }
            let stored = Payment {
                id: state.next_payment_id(),
                invoice_id: payment.invoice_id,
                amount: payment.amount,
                date: received_at,
                method: payment.method,
                note: payment.note,
            };
            state.payments.push(stored.clone());
            Ok(stored)
        }

        async fn save_installment_status(
            &self,
            id: InstallmentId,
            status: InstallmentStatus,
        ) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let row = state
                .installments
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Installment", id))?;
            row.status = status;
            self.status_writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn insert_installment(
            &self,
            installment: NewInstallment,
            actor: UserId,
            at: DateTime<Utc>,
        ) -> Result<Installment, PortError> {
            let mut state = self.state.write().await;
            if !state.invoices.contains_key(&installment.invoice_id) {
                return Err(PortError::not_found("Invoice", installment.invoice_id));
            }
            self.check_audit()?;

            let row = installment.into_installment(state.next_installment_id());
            state.installments.insert(row.id, row.clone());
            state.append_audit(NewAuditEntry::added(&row, actor, at));
            Ok(row)
        }

        async fn update_installment(
            &self,
            id: InstallmentId,
            changes: &InstallmentChanges,
            actor: UserId,
            at: DateTime<Utc>,
        ) -> Result<InstallmentRevision, PortError> {
            let mut state = self.state.write().await;
            let before = state
                .installments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Installment", id))?;
            self.check_audit()?;

            let revision = InstallmentRevision {
                after: before.with_changes(changes),
                before,
            };
            state.installments.insert(id, revision.after.clone());
            state.append_audit(NewAuditEntry::edited(&revision, actor, at));
            Ok(revision)
        }

        async fn delete_installment(
            &self,
            id: InstallmentId,
            actor: UserId,
            at: DateTime<Utc>,
        ) -> Result<Installment, PortError> {
            let mut state = self.state.write().await;
            if !state.installments.contains_key(&id) {
                return Err(PortError::not_found("Installment", id));
            }
            self.check_audit()?;

            let before = state
                .installments
                .remove(&id)
                .ok_or_else(|| PortError::not_found("Installment", id))?;
            state.append_audit(NewAuditEntry::deleted(&before, actor, at));
            Ok(before)
        }

        async fn get_audit_log(&self, installment_id: InstallmentId) -> Result<Vec<AuditLogView>, PortError> {
            self.check_reads()?;
            let state = self.state.read().await;
            let mut rows: Vec<AuditLogView> = state
                .audit
                .iter()
                .filter(|e| e.installment_id == installment_id)
                .map(|e| {
                    let user = state.users.get(&e.actor);
                    AuditLogView {
                        id: e.id,
                        action: e.action,
                        timestamp: e.timestamp,
                        before: e.before.clone(),
                        after: e.after.clone(),
                        user_name: user.map(|(name, _)| name.clone()),
                        user_email: user.map(|(_, email)| email.clone()),
                    }
                })
                .collect();
            rows.sort_by_key(|e| (e.timestamp, e.id));
            Ok(rows)
        }
    }

    /// Notifier that records every notice it is given
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        sent: RwLock<Vec<InstallmentNotice>>,
        failing: AtomicBool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// A notifier whose every delivery fails
        pub fn failing() -> Self {
            let notifier = Self::default();
            notifier.failing.store(true, Ordering::SeqCst);
            notifier
        }

        /// Notices accepted so far, in order
        pub async fn sent(&self) -> Vec<InstallmentNotice> {
            self.sent.read().await.clone()
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl HealthCheckable for RecordingNotifier {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "recording-notifier".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl NotificationPort for RecordingNotifier {
        async fn notify(&self, notice: &InstallmentNotice) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "recording-notifier".to_string(),
                });
            }
            self.sent.write().await.push(notice.clone());
            Ok(())
        }
    }
}
