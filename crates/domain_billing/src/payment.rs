//! Payments received against an invoice
//!
//! Payments are pooled per invoice: a payment is never tied to a specific
//! installment. The reconciliation engine sums them and spends the pool
//! across the schedule in due-date order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, MinorUnits, PaymentId};

use crate::error::PaymentPlanError;

/// A payment record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    /// Amount received, in minor units. Always positive.
    pub amount: MinorUnits,
    /// When the payment was received
    pub date: DateTime<Utc>,
    /// Free-form method label ("card", "wire", ...)
    pub method: Option<String>,
    pub note: Option<String>,
}

/// A payment to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub invoice_id: InvoiceId,
    pub amount: MinorUnits,
    pub method: Option<String>,
    pub note: Option<String>,
}

impl NewPayment {
    /// Builds a payment, rejecting non-positive amounts
    pub fn new(invoice_id: InvoiceId, amount: i64) -> Result<Self, PaymentPlanError> {
        let amount = MinorUnits::positive(amount)
            .map_err(|e| PaymentPlanError::validation("amount", e.to_string()))?;
        Ok(Self {
            invoice_id,
            amount,
            method: None,
            note: None,
        })
    }

    /// Sets the method label, ignoring blank input
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = non_blank(method.into());
        self
    }

    /// Sets the note, ignoring blank input
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = non_blank(note.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sums every payment recorded against an invoice
pub fn payment_pool(payments: &[Payment]) -> MinorUnits {
    payments.iter().map(|p| p.amount).sum()
}
