//! PostgreSQL Ledger Adapter
//!
//! This module provides the database adapter for the billing domain,
//! implementing the `LedgerPort` trait on top of `PaymentPlanRepository`.
//!
//! # Overview
//!
//! The `PostgresLedgerAdapter` serves as the bridge between the domain layer's
//! port interface and the database layer. It:
//!
//! - Translates domain requests into repository operations
//! - Converts database row types back to domain models
//! - Runs every audited installment write and its log entry in one transaction
//! - Handles error translation between database and port errors
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerAdapter;
//! use domain_billing::LedgerPort;
//! use std::sync::Arc;
//!
//! let ledger: Arc<dyn LedgerPort> = Arc::new(PostgresLedgerAdapter::new(pool));
//! let schedule = ledger.get_installments(invoice_id).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, AuditEntryId, ClientId, Currency, DomainPort, HealthCheckResult,
    HealthCheckable, InstallmentId, InvoiceId, MinorUnits, PaymentId, PortError, UserId,
};
use domain_billing::{
    AuditAction, AuditLogView, Client, Installment, InstallmentChanges, InstallmentRevision,
    InstallmentStatus, InstallmentSummary, Invoice, InvoiceStatus, InvoiceWithClient, LedgerPort,
    NewAuditEntry, NewInstallment, NewPayment, Payment,
};

use crate::error::DatabaseError;
use crate::repositories::payment_plans::{
    InvoiceWithClientRow, NewPaymentRow, NewPlanLogRow, NewPlanRow, PaymentPlanRepository,
    PaymentPlanRow, PaymentPlanSummaryRow, PaymentRow, PlanAction, PlanLogViewRow, PlanStatus,
};

/// PostgreSQL-backed implementation of the LedgerPort trait
///
/// # Health Checking
///
/// The adapter implements `HealthCheckable` by running `SELECT 1` against
/// the pool.
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `DatabaseError::NotFound` -> `PortError::NotFound`
/// - constraint and serialization conflicts -> `PortError::Conflict`
/// - connection and pool errors -> transient `PortError`s
/// - Other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresLedgerAdapter {
    repository: PaymentPlanRepository,
    pool: PgPool,
}

impl PostgresLedgerAdapter {
    /// Creates a new PostgreSQL ledger adapter
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PaymentPlanRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &PaymentPlanRepository {
        &self.repository
    }
}

impl DomainPort for PostgresLedgerAdapter {}

#[async_trait]
impl HealthCheckable for PostgresLedgerAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-ledger-adapter".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-ledger-adapter".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerPort for PostgresLedgerAdapter {
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice_with_client(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Option<InvoiceWithClient>, PortError> {
        let row = self.repository.find_invoice_with_client(invoice_id.value()).await?;
        row.map(row_to_invoice).transpose()
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_installments(&self, invoice_id: InvoiceId) -> Result<Vec<Installment>, PortError> {
        let rows = self.repository.list_plans(invoice_id.value()).await?;
        debug!(count = rows.len(), "loaded installments");
        rows.into_iter().map(row_to_installment).collect()
    }

    #[instrument(skip(self), fields(installment_id = %id))]
    async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>, PortError> {
        let row = self.repository.find_plan(id.value()).await?;
        row.map(row_to_installment).transpose()
    }

    #[instrument(skip(self))]
    async fn list_all_installments(&self) -> Result<Vec<InstallmentSummary>, PortError> {
        let rows = self.repository.list_all_plans().await?;
        rows.into_iter().map(row_to_summary).collect()
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        let rows = self.repository.list_payments(invoice_id.value()).await?;
        debug!(count = rows.len(), "loaded payments");
        rows.into_iter().map(row_to_payment).collect()
    }

    #[instrument(skip(self, payment), fields(invoice_id = %payment.invoice_id))]
    async fn record_payment(
        &self,
        payment: NewPayment,
        received_at: DateTime<Utc>,
    ) -> Result<Payment, PortError> {
        let invoice_id = payment.invoice_id;
        let row = self
            .repository
            .insert_payment(NewPaymentRow {
                invoice_id: invoice_id.value(),
                amount: payment.amount.value(),
                date: received_at,
                method: payment.method,
                note: payment.note,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::ForeignKeyViolation(_) => DatabaseError::not_found("Invoice", invoice_id),
                other => other,
            })?;

        row_to_payment(row)
    }

    #[instrument(skip(self), fields(installment_id = %id, status = %status))]
    async fn save_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<(), PortError> {
        let touched = self
            .repository
            .update_plan_status(id.value(), domain_to_db_status(status))
            .await?;
        if touched == 0 {
            return Err(PortError::not_found("Installment", id));
        }
        Ok(())
    }

    #[instrument(skip(self, installment), fields(invoice_id = %installment.invoice_id, actor = %actor))]
    async fn insert_installment(
        &self,
        installment: NewInstallment,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Installment, PortError> {
        let mut tx = self.repository.begin().await?;

        if !PaymentPlanRepository::invoice_exists(&mut *tx, installment.invoice_id.value()).await? {
            return Err(PortError::not_found("Invoice", installment.invoice_id));
        }

        let row = PaymentPlanRepository::insert_plan(
            &mut *tx,
            NewPlanRow {
                invoice_id: installment.invoice_id.value(),
                due_date: installment.due_date,
                amount: installment.amount.value(),
            },
        )
        .await?;
        let created = row_to_installment(row)?;

        PaymentPlanRepository::insert_log(&mut *tx, audit_to_row(NewAuditEntry::added(&created, actor, at)))
            .await?;
        commit(tx).await?;

        Ok(created)
    }

    #[instrument(skip(self, changes), fields(installment_id = %id, actor = %actor))]
    async fn update_installment(
        &self,
        id: InstallmentId,
        changes: &InstallmentChanges,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<InstallmentRevision, PortError> {
        let mut tx = self.repository.begin().await?;

        let row = PaymentPlanRepository::lock_plan(&mut *tx, id.value())
            .await?
            .ok_or_else(|| PortError::not_found("Installment", id))?;
        let before = row_to_installment(row)?;
        let after = before.with_changes(changes);

        PaymentPlanRepository::update_plan(&mut *tx, &installment_to_row(&after)).await?;
        let revision = InstallmentRevision { before, after };
        PaymentPlanRepository::insert_log(&mut *tx, audit_to_row(NewAuditEntry::edited(&revision, actor, at)))
            .await?;
        commit(tx).await?;

        Ok(revision)
    }

    #[instrument(skip(self), fields(installment_id = %id, actor = %actor))]
    async fn delete_installment(
        &self,
        id: InstallmentId,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Installment, PortError> {
        let mut tx = self.repository.begin().await?;

        let row = PaymentPlanRepository::lock_plan(&mut *tx, id.value())
            .await?
            .ok_or_else(|| PortError::not_found("Installment", id))?;
        let before = row_to_installment(row)?;

        PaymentPlanRepository::delete_plan(&mut *tx, id.value()).await?;
        PaymentPlanRepository::insert_log(&mut *tx, audit_to_row(NewAuditEntry::deleted(&before, actor, at)))
            .await?;
        commit(tx).await?;

        Ok(before)
    }

    #[instrument(skip(self), fields(installment_id = %installment_id))]
    async fn get_audit_log(&self, installment_id: InstallmentId) -> Result<Vec<AuditLogView>, PortError> {
        let rows = self.repository.list_logs(installment_id.value()).await?;
        Ok(rows.into_iter().map(row_to_log_view).collect())
    }
}

async fn commit(tx: sqlx::Transaction<'static, sqlx::Postgres>) -> Result<(), DatabaseError> {
    tx.commit()
        .await
        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
}

// ============================================================================
// Type conversions
// ============================================================================

fn db_to_domain_status(status: PlanStatus) -> InstallmentStatus {
    match status {
        PlanStatus::Pending => InstallmentStatus::Pending,
        PlanStatus::Paid => InstallmentStatus::Paid,
        PlanStatus::Overdue => InstallmentStatus::Overdue,
    }
}

fn domain_to_db_status(status: InstallmentStatus) -> PlanStatus {
    match status {
        InstallmentStatus::Pending => PlanStatus::Pending,
        InstallmentStatus::Paid => PlanStatus::Paid,
        InstallmentStatus::Overdue => PlanStatus::Overdue,
    }
}

fn db_to_domain_action(action: PlanAction) -> AuditAction {
    match action {
        PlanAction::Add => AuditAction::Add,
        PlanAction::Edit => AuditAction::Edit,
        PlanAction::Delete => AuditAction::Delete,
    }
}

fn domain_to_db_action(action: AuditAction) -> PlanAction {
    match action {
        AuditAction::Add => PlanAction::Add,
        AuditAction::Edit => PlanAction::Edit,
        AuditAction::Delete => PlanAction::Delete,
    }
}

/// Stored amounts are positive by table constraint; anything else is corrupt data
fn positive_amount(value: i64, entity: &str, id: i64) -> Result<MinorUnits, PortError> {
    MinorUnits::positive(value).map_err(|_| {
        PortError::transformation(format!("{} {} has non-positive amount {}", entity, id, value))
    })
}

fn row_to_installment(row: PaymentPlanRow) -> Result<Installment, PortError> {
    Ok(Installment {
        id: InstallmentId::new(row.id),
        invoice_id: InvoiceId::new(row.invoice_id),
        due_date: row.due_date,
        amount: positive_amount(row.amount, "installment", row.id)?,
        status: db_to_domain_status(row.status),
    })
}

fn installment_to_row(installment: &Installment) -> PaymentPlanRow {
    PaymentPlanRow {
        id: installment.id.value(),
        invoice_id: installment.invoice_id.value(),
        due_date: installment.due_date,
        amount: installment.amount.value(),
        status: domain_to_db_status(installment.status),
    }
}

fn row_to_summary(row: PaymentPlanSummaryRow) -> Result<InstallmentSummary, PortError> {
    Ok(InstallmentSummary {
        id: InstallmentId::new(row.id),
        invoice_id: InvoiceId::new(row.invoice_id),
        due_date: row.due_date,
        amount: positive_amount(row.amount, "installment", row.id)?,
        status: db_to_domain_status(row.status),
        client_name: row.client_name,
    })
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PortError> {
    Ok(Payment {
        id: PaymentId::new(row.id),
        invoice_id: InvoiceId::new(row.invoice_id),
        amount: positive_amount(row.amount, "payment", row.id)?,
        date: row.date,
        method: row.method,
        note: row.note,
    })
}

fn row_to_invoice(row: InvoiceWithClientRow) -> Result<InvoiceWithClient, PortError> {
    let currency: Currency = row
        .currency
        .parse()
        .map_err(|e| PortError::transformation(format!("invoice {}: {}", row.id, e)))?;
    let status: InvoiceStatus = row
        .status
        .parse()
        .map_err(|e| PortError::transformation(format!("invoice {}: {}", row.id, e)))?;

    let client = match (row.client_name, row.client_email) {
        (Some(name), Some(email)) => Some(Client {
            id: ClientId::new(row.client_id),
            name,
            email,
        }),
        _ => None,
    };

    Ok(InvoiceWithClient {
        invoice: Invoice {
            id: InvoiceId::new(row.id),
            client_id: ClientId::new(row.client_id),
            total: MinorUnits::new(row.total),
            currency,
            due_date: row.due_date,
            status,
            payment_link: row.stripe_payment_link,
            paid_at: row.paid_at,
        },
        client,
    })
}

fn row_to_log_view(row: PlanLogViewRow) -> AuditLogView {
    AuditLogView {
        id: AuditEntryId::new(row.id),
        action: db_to_domain_action(row.action),
        timestamp: row.timestamp,
        before: row.before,
        after: row.after,
        user_name: row.user_name,
        user_email: row.user_email,
    }
}

fn audit_to_row(entry: NewAuditEntry) -> NewPlanLogRow {
    NewPlanLogRow {
        plan_id: entry.installment_id.value(),
        user_id: entry.actor.value(),
        action: domain_to_db_action(entry.action),
        timestamp: entry.timestamp,
        before: entry.before,
        after: entry.after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn invoice_row() -> InvoiceWithClientRow {
        InvoiceWithClientRow {
            id: 7,
            client_id: 3,
            total: 10000,
            currency: "USD".to_string(),
            due_date: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            status: "sent".to_string(),
            stripe_payment_link: None,
            paid_at: None,
            client_name: Some("Initech".to_string()),
            client_email: Some("ap@initech.test".to_string()),
        }
    }

    #[test]
    fn test_status_conversion_round_trip() {
        for status in [InstallmentStatus::Pending, InstallmentStatus::Paid, InstallmentStatus::Overdue] {
            assert_eq!(db_to_domain_status(domain_to_db_status(status)), status);
        }
    }

    #[test]
    fn test_invoice_row_with_client() {
        let invoice = row_to_invoice(invoice_row()).unwrap();
        assert_eq!(invoice.invoice.id, InvoiceId::new(7));
        assert_eq!(invoice.invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.client.unwrap().email, "ap@initech.test");
    }

    #[test]
    fn test_invoice_row_without_client() {
        let mut row = invoice_row();
        row.client_name = None;
        row.client_email = None;
        assert!(row_to_invoice(row).unwrap().client.is_none());
    }

    #[test]
    fn test_unknown_currency_is_transformation_error() {
        let mut row = invoice_row();
        row.currency = "XYZ".to_string();
        assert!(matches!(row_to_invoice(row), Err(PortError::Transformation { .. })));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let row = PaymentPlanRow {
            id: 1,
            invoice_id: 7,
            due_date: Utc::now(),
            amount: 0,
            status: PlanStatus::Pending,
        };
        assert!(row_to_installment(row).is_err());
    }

    #[test]
    fn test_audit_entry_to_row() {
        let installment = Installment {
            id: InstallmentId::new(4),
            invoice_id: InvoiceId::new(7),
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            amount: MinorUnits::new(2500),
            status: InstallmentStatus::Pending,
        };
        let row = audit_to_row(NewAuditEntry::added(&installment, UserId::new(9), Utc::now()));
        assert_eq!(row.plan_id, 4);
        assert_eq!(row.user_id, 9);
        assert_eq!(row.action, PlanAction::Add);
        assert!(row.before.is_none());
    }
}
