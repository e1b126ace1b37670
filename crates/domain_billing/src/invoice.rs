//! Invoices and the clients they are addressed to
//!
//! The payment plan engine never mutates an invoice. It reads one to find
//! the client that should receive installment notices and the currency the
//! amounts are denominated in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClientId, Currency, InvoiceId, MinorUnits};

use crate::error::PaymentPlanError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Invoice has been sent to the client
    Sent,
    /// Settled in full through direct payment
    Paid,
    /// Past due date
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = PaymentPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(PaymentPlanError::validation(
                "status",
                format!("unknown invoice status '{}'", other),
            )),
        }
    }
}

/// An invoice issued to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub client_id: ClientId,
    /// Invoice total in minor units
    pub total: MinorUnits,
    pub currency: Currency,
    pub due_date: DateTime<Utc>,
    pub status: InvoiceStatus,
    /// Hosted checkout link, included in client notices when present
    pub payment_link: Option<String>,
    /// Set when the invoice is settled in full outside the installment schedule
    pub paid_at: Option<DateTime<Utc>>,
}

/// Contact details of the client an invoice is billed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
}

/// An invoice joined with its client
///
/// The client is optional because the join is a left join: notices are
/// skipped when the client row is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceWithClient {
    pub invoice: Invoice,
    pub client: Option<Client>,
}
