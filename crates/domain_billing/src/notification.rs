//! Installment notices sent to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{InstallmentId, InvoiceId, Money};

use crate::installment::{Installment, InstallmentStatus};
use crate::invoice::InvoiceWithClient;
use crate::ports::NotificationPort;

/// Why a client is being notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationEvent {
    /// An installment was added to the schedule
    New,
    /// An installment was edited
    Updated,
    /// An installment passed its due date unpaid
    Overdue,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::New => "new",
            NotificationEvent::Updated => "updated",
            NotificationEvent::Overdue => "overdue",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a notifier needs to tell a client about one installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentNotice {
    /// Recipient email address
    pub to: String,
    pub event: NotificationEvent,
    pub invoice_id: InvoiceId,
    pub installment_id: InstallmentId,
    pub client_name: String,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
    pub status: InstallmentStatus,
    pub payment_link: Option<String>,
}

impl InstallmentNotice {
    /// Builds a notice addressed to the invoice's client
    ///
    /// Returns `None` when the invoice has no client on record.
    pub fn for_installment(
        event: NotificationEvent,
        installment: &Installment,
        invoice: &InvoiceWithClient,
    ) -> Option<Self> {
        let client = invoice.client.as_ref()?;
        Some(Self {
            to: client.email.clone(),
            event,
            invoice_id: invoice.invoice.id,
            installment_id: installment.id,
            client_name: client.name.clone(),
            due_date: installment.due_date,
            amount: Money::new(installment.amount, invoice.invoice.currency),
            status: installment.status,
            payment_link: invoice.invoice.payment_link.clone(),
        })
    }
}

/// Sends a notice, logging and swallowing any failure
///
/// Returns true when the notifier accepted the notice.
pub async fn notify_best_effort(notifier: &dyn NotificationPort, notice: &InstallmentNotice) -> bool {
    match notifier.notify(notice).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(
                invoice_id = %notice.invoice_id,
                installment_id = %notice.installment_id,
                event = %notice.event,
                error = %error,
                "installment notice not delivered"
            );
            false
        }
    }
}
