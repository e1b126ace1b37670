//! Payment plan repository implementation
//!
//! This module provides database access for installments, the payments
//! they are reconciled against, and the audit log of manual edits.
//!
//! Queries are built at runtime and decoded through `FromRow` row types, so
//! the crate compiles without a live database. Methods that take a
//! `PgConnection` run inside a caller-owned transaction.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::error::DatabaseError;

/// Repository for payment plans, payments and the plan audit log
#[derive(Debug, Clone)]
pub struct PaymentPlanRepository {
    pool: PgPool,
}

impl PaymentPlanRepository {
    /// Creates a new PaymentPlanRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Starts a transaction for an audited write
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    /// Loads an invoice left-joined with its client
    pub async fn find_invoice_with_client(
        &self,
        invoice_id: i64,
    ) -> Result<Option<InvoiceWithClientRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceWithClientRow>(
            r#"
            SELECT
                i.id,
                i.client_id,
                i.total,
                i.currency,
                i.due_date,
                i.status,
                i.stripe_payment_link,
                i.paid_at,
                c.name AS client_name,
                c.email AS client_email
            FROM invoices i
            LEFT JOIN clients c ON c.id = i.client_id
            WHERE i.id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists the installments of an invoice ordered by due date, then id
    pub async fn list_plans(&self, invoice_id: i64) -> Result<Vec<PaymentPlanRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentPlanRow>(
            r#"
            SELECT id, invoice_id, due_date, amount, status
            FROM payment_plans
            WHERE invoice_id = $1
            ORDER BY due_date ASC, id ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_plan(&self, id: i64) -> Result<Option<PaymentPlanRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentPlanRow>(
            r#"
            SELECT id, invoice_id, due_date, amount, status
            FROM payment_plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists every installment with the name of the invoice's client
    pub async fn list_all_plans(&self) -> Result<Vec<PaymentPlanSummaryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentPlanSummaryRow>(
            r#"
            SELECT
                p.id,
                p.invoice_id,
                p.due_date,
                p.amount,
                p.status,
                c.name AS client_name
            FROM payment_plans p
            LEFT JOIN invoices i ON i.id = p.invoice_id
            LEFT JOIN clients c ON c.id = i.client_id
            ORDER BY p.due_date ASC, p.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sets the status of an installment, returning the number of rows touched
    pub async fn update_plan_status(&self, id: i64, status: PlanStatus) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE payment_plans SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists the payments of an invoice ordered by date, then id
    pub async fn list_payments(&self, invoice_id: i64) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, invoice_id, amount, date, method, note
            FROM payments
            WHERE invoice_id = $1
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_payment(&self, payment: NewPaymentRow) -> Result<PaymentRow, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (invoice_id, amount, date, method, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, amount, date, method, note
            "#,
        )
        .bind(payment.invoice_id)
        .bind(payment.amount)
        .bind(payment.date)
        .bind(payment.method)
        .bind(payment.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists the audit log of an installment, oldest first, with the actor's details
    pub async fn list_logs(&self, plan_id: i64) -> Result<Vec<PlanLogViewRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PlanLogViewRow>(
            r#"
            SELECT
                l.id,
                l.action,
                l.timestamp,
                l.before,
                l.after,
                u.name AS user_name,
                u.email AS user_email
            FROM payment_plan_logs l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.plan_id = $1
            ORDER BY l.timestamp ASC, l.id ASC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Transactional statements
    // ------------------------------------------------------------------

    pub async fn invoice_exists(conn: &mut PgConnection, invoice_id: i64) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM invoices WHERE id = $1)")
            .bind(invoice_id)
            .fetch_one(conn)
            .await?;

        Ok(exists)
    }

    /// Loads an installment and locks its row until the transaction ends
    pub async fn lock_plan(conn: &mut PgConnection, id: i64) -> Result<Option<PaymentPlanRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentPlanRow>(
            r#"
            SELECT id, invoice_id, due_date, amount, status
            FROM payment_plans
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    pub async fn insert_plan(conn: &mut PgConnection, plan: NewPlanRow) -> Result<PaymentPlanRow, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentPlanRow>(
            r#"
            INSERT INTO payment_plans (invoice_id, due_date, amount, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, invoice_id, due_date, amount, status
            "#,
        )
        .bind(plan.invoice_id)
        .bind(plan.due_date)
        .bind(plan.amount)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn update_plan(conn: &mut PgConnection, plan: &PaymentPlanRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE payment_plans
            SET due_date = $2, amount = $3, status = $4
            WHERE id = $1
            "#,
        )
        .bind(plan.id)
        .bind(plan.due_date)
        .bind(plan.amount)
        .bind(plan.status)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn delete_plan(conn: &mut PgConnection, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM payment_plans WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn insert_log(conn: &mut PgConnection, log: NewPlanLogRow) -> Result<i64, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO payment_plan_logs (plan_id, user_id, action, timestamp, before, after)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(log.plan_id)
        .bind(log.user_id)
        .bind(log.action)
        .bind(log.timestamp)
        .bind(log.before)
        .bind(log.after)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }
}

// ============================================================================
// Enum types
// ============================================================================

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_plan_status", rename_all = "lowercase")]
pub enum PlanStatus {
    Pending,
    Paid,
    Overdue,
}

/// Audit log action
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_plan_action", rename_all = "lowercase")]
pub enum PlanAction {
    Add,
    Edit,
    Delete,
}

// ============================================================================
// Row types
// ============================================================================

/// Invoice joined with its client. Client columns are null when the client is gone.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceWithClientRow {
    pub id: i64,
    pub client_id: i64,
    pub total: i64,
    pub currency: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub stripe_payment_link: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentPlanRow {
    pub id: i64,
    pub invoice_id: i64,
    pub due_date: DateTime<Utc>,
    pub amount: i64,
    pub status: PlanStatus,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentPlanSummaryRow {
    pub id: i64,
    pub invoice_id: i64,
    pub due_date: DateTime<Utc>,
    pub amount: i64,
    pub status: PlanStatus,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub method: Option<String>,
    pub note: Option<String>,
}

/// Audit log entry joined with the acting user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanLogViewRow {
    pub id: i64,
    pub action: PlanAction,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

// ============================================================================
// Insert types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPlanRow {
    pub invoice_id: i64,
    pub due_date: DateTime<Utc>,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct NewPaymentRow {
    pub invoice_id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub method: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlanLogRow {
    pub plan_id: i64,
    pub user_id: i64,
    pub action: PlanAction,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
}
