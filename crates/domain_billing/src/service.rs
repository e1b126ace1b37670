//! Payment plan management service
//!
//! Role-gated operations over an invoice's installment schedule. Writes go
//! through the ledger together with their audit entries; notices are sent
//! afterwards and never undo a write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, InstallmentId, InvoiceId};

use crate::access::Caller;
use crate::audit::AuditLogView;
use crate::error::PaymentPlanError;
use crate::installment::{
    Installment, InstallmentChanges, InstallmentStatus, InstallmentSummary, NewInstallment,
};
use crate::invoice::InvoiceWithClient;
use crate::notification::{notify_best_effort, InstallmentNotice, NotificationEvent};
use crate::payment::{NewPayment, Payment};
use crate::ports::{LedgerPort, NotificationPort};
use crate::reconciliation::{ReconciliationEngine, ReconciliationReport};

/// Whether reads reconcile the schedule before returning it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Every `list` runs a reconciliation pass first
    #[default]
    ReconcileOnRead,
    /// Reads return stored statuses; reconciliation runs on request only
    Observational,
}

/// Input for scheduling an installment
#[derive(Debug, Clone)]
pub struct CreateInstallment {
    pub invoice_id: InvoiceId,
    pub due_date: Option<DateTime<Utc>>,
    pub amount: Option<i64>,
}

/// Input for editing an installment. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateInstallment {
    pub due_date: Option<DateTime<Utc>>,
    pub amount: Option<i64>,
    pub status: Option<InstallmentStatus>,
}

/// Input for recording a payment
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub invoice_id: InvoiceId,
    pub amount: i64,
    pub method: Option<String>,
    pub note: Option<String>,
}

/// Payment plan management service
pub struct PaymentPlanService {
    ledger: Arc<dyn LedgerPort>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn Clock>,
    engine: ReconciliationEngine,
    read_policy: ReadPolicy,
}

impl PaymentPlanService {
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let engine = ReconciliationEngine::new(ledger.clone(), notifier.clone(), clock.clone());
        Self {
            ledger,
            notifier,
            clock,
            engine,
            read_policy: ReadPolicy::default(),
        }
    }

    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Installments of an invoice, due date ascending
    ///
    /// Open to any authenticated caller. An unknown invoice yields an empty
    /// schedule.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, invoice_id = %invoice_id))]
    pub async fn list(
        &self,
        caller: &Caller,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Installment>, PaymentPlanError> {
        if self.read_policy == ReadPolicy::ReconcileOnRead {
            self.engine.reconcile(invoice_id).await?;
        }
        Ok(self.ledger.get_installments(invoice_id).await?)
    }

    #[instrument(skip(self, caller, input), fields(user_id = %caller.user_id, invoice_id = %input.invoice_id))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CreateInstallment,
    ) -> Result<Installment, PaymentPlanError> {
        caller.require_plan_manager()?;
        let new = NewInstallment::new(input.invoice_id, input.due_date, input.amount)?;

        let invoice = self
            .ledger
            .get_invoice_with_client(new.invoice_id)
            .await?
            .ok_or_else(|| PaymentPlanError::not_found("Invoice", new.invoice_id))?;

        let created = self
            .ledger
            .insert_installment(new, caller.user_id, self.clock.now())
            .await?;
        info!(installment_id = %created.id, amount = %created.amount, "installment scheduled");

        self.send_notice(NotificationEvent::New, &created, &invoice).await;
        Ok(created)
    }

    #[instrument(skip(self, caller, input), fields(user_id = %caller.user_id, installment_id = %id))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: InstallmentId,
        input: UpdateInstallment,
    ) -> Result<Installment, PaymentPlanError> {
        caller.require_plan_manager()?;
        let changes = InstallmentChanges::new(input.due_date, input.amount, input.status)?;

        let revision = self
            .ledger
            .update_installment(id, &changes, caller.user_id, self.clock.now())
            .await?;
        info!(
            from = %revision.before.status,
            to = %revision.after.status,
            "installment edited"
        );

        match self.ledger.get_invoice_with_client(revision.after.invoice_id).await {
            Ok(Some(invoice)) => {
                self.send_notice(NotificationEvent::Updated, &revision.after, &invoice)
                    .await
            }
            Ok(None) => {}
            Err(error) => warn!(error = %error, "invoice lookup failed, update notice skipped"),
        }

        Ok(revision.after)
    }

    /// Removes an installment. No notice is sent.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, installment_id = %id))]
    pub async fn delete(
        &self,
        caller: &Caller,
        id: InstallmentId,
    ) -> Result<Installment, PaymentPlanError> {
        caller.require_plan_manager()?;
        let deleted = self
            .ledger
            .delete_installment(id, caller.user_id, self.clock.now())
            .await?;
        info!(invoice_id = %deleted.invoice_id, "installment deleted");
        Ok(deleted)
    }

    /// Audit trail of an installment, oldest first
    ///
    /// Entries remain readable after the installment itself is deleted.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, installment_id = %id))]
    pub async fn audit_log(
        &self,
        caller: &Caller,
        id: InstallmentId,
    ) -> Result<Vec<AuditLogView>, PaymentPlanError> {
        caller.require_plan_manager()?;
        Ok(self.ledger.get_audit_log(id).await?)
    }

    /// Every installment across all invoices, with client names
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<InstallmentSummary>, PaymentPlanError> {
        caller.require_plan_manager()?;
        Ok(self.ledger.list_all_installments().await?)
    }

    /// Runs a reconciliation pass on request
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, invoice_id = %invoice_id))]
    pub async fn reconcile(
        &self,
        caller: &Caller,
        invoice_id: InvoiceId,
    ) -> Result<ReconciliationReport, PaymentPlanError> {
        caller.require_plan_manager()?;
        Ok(self.engine.reconcile(invoice_id).await?)
    }

    /// Records a payment against an invoice
    ///
    /// Statuses are not touched here; the next reconciliation applies the
    /// larger pool.
    #[instrument(skip(self, caller, input), fields(user_id = %caller.user_id, invoice_id = %input.invoice_id))]
    pub async fn record_payment(
        &self,
        caller: &Caller,
        input: RecordPayment,
    ) -> Result<Payment, PaymentPlanError> {
        let mut payment = NewPayment::new(input.invoice_id, input.amount)?;
        if let Some(method) = input.method {
            payment = payment.with_method(method);
        }
        if let Some(note) = input.note {
            payment = payment.with_note(note);
        }

        self.require_invoice(payment.invoice_id).await?;
        let stored = self.ledger.record_payment(payment, self.clock.now()).await?;
        info!(payment_id = %stored.id, amount = %stored.amount, "payment recorded");
        Ok(stored)
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, invoice_id = %invoice_id))]
    pub async fn list_payments(
        &self,
        caller: &Caller,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PaymentPlanError> {
        self.require_invoice(invoice_id).await?;
        Ok(self.ledger.get_payments(invoice_id).await?)
    }

    async fn require_invoice(&self, invoice_id: InvoiceId) -> Result<InvoiceWithClient, PaymentPlanError> {
        self.ledger
            .get_invoice_with_client(invoice_id)
            .await?
            .ok_or_else(|| PaymentPlanError::not_found("Invoice", invoice_id))
    }

    async fn send_notice(
        &self,
        event: NotificationEvent,
        installment: &Installment,
        invoice: &InvoiceWithClient,
    ) {
        match InstallmentNotice::for_installment(event, installment, invoice) {
            Some(notice) => {
                notify_best_effort(self.notifier.as_ref(), &notice).await;
            }
            None => warn!(
                invoice_id = %invoice.invoice.id,
                event = %event,
                "invoice has no client on record, notice skipped"
            ),
        }
    }
}
