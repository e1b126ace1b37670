//! Payment plan DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use core_kernel::InvoiceId;
use domain_billing::{
    AuditLogView, CreateInstallment, Installment, InstallmentStatus, InstallmentSummary,
    ReconciliationReport, UpdateInstallment,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPlanRequest {
    pub invoice_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    pub amount: Option<i64>,
}

impl CreatePaymentPlanRequest {
    /// The domain input, or `None` when the invoice id is missing
    pub fn into_input(self) -> Option<CreateInstallment> {
        Some(CreateInstallment {
            invoice_id: InvoiceId::new(self.invoice_id?),
            due_date: self.due_date,
            amount: self.amount,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentPlanRequest {
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    pub amount: Option<i64>,
    pub status: Option<InstallmentStatus>,
}

impl From<UpdatePaymentPlanRequest> for UpdateInstallment {
    fn from(request: UpdatePaymentPlanRequest) -> Self {
        UpdateInstallment {
            due_date: request.due_date,
            amount: request.amount,
            status: request.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanResponse {
    pub id: i64,
    pub invoice_id: i64,
    pub due_date: DateTime<Utc>,
    pub amount: i64,
    pub status: InstallmentStatus,
}

impl From<Installment> for PaymentPlanResponse {
    fn from(installment: Installment) -> Self {
        Self {
            id: installment.id.value(),
            invoice_id: installment.invoice_id.value(),
            due_date: installment.due_date,
            amount: installment.amount.value(),
            status: installment.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanSummaryResponse {
    pub id: i64,
    pub invoice_id: i64,
    pub due_date: DateTime<Utc>,
    pub amount: i64,
    pub status: InstallmentStatus,
    pub client_name: Option<String>,
}

impl From<InstallmentSummary> for PaymentPlanSummaryResponse {
    fn from(summary: InstallmentSummary) -> Self {
        Self {
            id: summary.id.value(),
            invoice_id: summary.invoice_id.value(),
            due_date: summary.due_date,
            amount: summary.amount.value(),
            status: summary.status,
            client_name: summary.client_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<AuditLogView> for AuditLogResponse {
    fn from(view: AuditLogView) -> Self {
        Self {
            id: view.id.value(),
            action: view.action.as_str().to_string(),
            timestamp: view.timestamp,
            before: view.before,
            after: view.after,
            user_name: view.user_name,
            user_email: view.user_email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub id: i64,
    pub from: InstallmentStatus,
    pub to: InstallmentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub invoice_id: i64,
    pub changes: Vec<StatusChangeResponse>,
    pub notices_sent: usize,
    /// Payment pool left after every coverable installment is funded
    pub unapplied: i64,
}

impl From<ReconciliationReport> for ReconcileResponse {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            invoice_id: report.invoice_id.value(),
            changes: report
                .transitions
                .into_iter()
                .map(|t| StatusChangeResponse {
                    id: t.installment_id.value(),
                    from: t.from,
                    to: t.to,
                })
                .collect(),
            notices_sent: report.notices_sent,
            unapplied: report.unapplied.value(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}
