//! Payment plan installments
//!
//! An installment is one scheduled partial amount of an invoice. Its status
//! is derived by the reconciliation engine from the payment pool and the
//! due date, but an owner or admin may override any field by hand.
//!
//! ```text
//!  [created: pending] --(pool covers amount, in due-date order)--> [paid]
//!  [pending] --(due date passes)--> [overdue]
//!  [overdue] --(pool later covers amount)--> [paid]
//!  [paid] --(terminal under reconciliation)--
//!  any --(explicit admin edit)--> any
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use core_kernel::{InstallmentId, InvoiceId, MinorUnits};

use crate::error::PaymentPlanError;

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    /// Not yet covered and not yet due
    Pending,
    /// Covered by the payment pool, or marked paid by an admin
    Paid,
    /// Past due and not covered
    Overdue,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, InstallmentStatus::Paid)
    }
}

impl Default for InstallmentStatus {
    fn default() -> Self {
        InstallmentStatus::Pending
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallmentStatus {
    type Err = PaymentPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InstallmentStatus::Pending),
            "paid" => Ok(InstallmentStatus::Paid),
            "overdue" => Ok(InstallmentStatus::Overdue),
            other => Err(PaymentPlanError::validation(
                "status",
                format!("expected pending, paid or overdue, got '{}'", other),
            )),
        }
    }
}

/// A scheduled installment of an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: InstallmentId,
    pub invoice_id: InvoiceId,
    pub due_date: DateTime<Utc>,
    /// Amount due, in minor units. Always positive.
    pub amount: MinorUnits,
    pub status: InstallmentStatus,
}

impl Installment {
    /// Returns true once the due date lies strictly before `now`
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now
    }

    /// Returns a copy with the supplied fields applied
    ///
    /// Edits are authoritative: a status set here is not re-validated
    /// against the payment pool.
    pub fn with_changes(&self, changes: &InstallmentChanges) -> Installment {
        Installment {
            id: self.id,
            invoice_id: self.invoice_id,
            due_date: changes.due_date.unwrap_or(self.due_date),
            amount: changes.amount.unwrap_or(self.amount),
            status: changes.status.unwrap_or(self.status),
        }
    }

    /// Opaque JSON snapshot stored in the audit trail
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id.value(),
            "invoiceId": self.invoice_id.value(),
            "dueDate": self.due_date.to_rfc3339(),
            "amount": self.amount.value(),
            "status": self.status.as_str(),
        })
    }
}

/// A validated request to schedule a new installment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallment {
    pub invoice_id: InvoiceId,
    pub due_date: DateTime<Utc>,
    pub amount: MinorUnits,
}

impl NewInstallment {
    /// Validates raw input. Both fields are required and the amount must be positive.
    pub fn new(
        invoice_id: InvoiceId,
        due_date: Option<DateTime<Utc>>,
        amount: Option<i64>,
    ) -> Result<Self, PaymentPlanError> {
        let due_date = due_date
            .ok_or_else(|| PaymentPlanError::validation("dueDate", "due date is required"))?;
        let amount = amount
            .ok_or_else(|| PaymentPlanError::validation("amount", "amount is required"))?;
        let amount = MinorUnits::positive(amount)
            .map_err(|e| PaymentPlanError::validation("amount", e.to_string()))?;

        Ok(Self {
            invoice_id,
            due_date,
            amount,
        })
    }

    /// The row as it is first stored: always pending
    pub fn into_installment(self, id: InstallmentId) -> Installment {
        Installment {
            id,
            invoice_id: self.invoice_id,
            due_date: self.due_date,
            amount: self.amount,
            status: InstallmentStatus::Pending,
        }
    }
}

/// A partial update to an installment. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallmentChanges {
    pub due_date: Option<DateTime<Utc>>,
    pub amount: Option<MinorUnits>,
    pub status: Option<InstallmentStatus>,
}

impl InstallmentChanges {
    /// Validates raw input from an edit request
    pub fn new(
        due_date: Option<DateTime<Utc>>,
        amount: Option<i64>,
        status: Option<InstallmentStatus>,
    ) -> Result<Self, PaymentPlanError> {
        let amount = amount
            .map(|a| {
                MinorUnits::positive(a)
                    .map_err(|e| PaymentPlanError::validation("amount", e.to_string()))
            })
            .transpose()?;

        let changes = Self {
            due_date,
            amount,
            status,
        };
        if changes.is_empty() {
            return Err(PaymentPlanError::validation(
                "body",
                "at least one of dueDate, amount or status must be supplied",
            ));
        }
        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.due_date.is_none() && self.amount.is_none() && self.status.is_none()
    }
}

/// The state of an installment before and after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentRevision {
    pub before: Installment,
    pub after: Installment,
}

/// An installment joined with the name of the client it is billed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentSummary {
    pub id: InstallmentId,
    pub invoice_id: InvoiceId,
    pub due_date: DateTime<Utc>,
    pub amount: MinorUnits,
    pub status: InstallmentStatus,
    pub client_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn installment() -> Installment {
        Installment {
            id: InstallmentId::new(1),
            invoice_id: InvoiceId::new(7),
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            amount: MinorUnits::new(2500),
            status: InstallmentStatus::Pending,
        }
    }

    #[test]
    fn test_new_installment_requires_fields() {
        let due = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let missing_due = NewInstallment::new(InvoiceId::new(7), None, Some(2500)).unwrap_err();
        assert!(matches!(missing_due, PaymentPlanError::Validation { field: "dueDate", .. }));

        let missing_amount = NewInstallment::new(InvoiceId::new(7), Some(due), None).unwrap_err();
        assert!(matches!(missing_amount, PaymentPlanError::Validation { field: "amount", .. }));

        let negative = NewInstallment::new(InvoiceId::new(7), Some(due), Some(-1)).unwrap_err();
        assert!(negative.is_validation());
    }

    #[test]
    fn test_new_installment_starts_pending() {
        let due = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let row = NewInstallment::new(InvoiceId::new(7), Some(due), Some(2500))
            .unwrap()
            .into_installment(InstallmentId::new(3));
        assert_eq!(row.status, InstallmentStatus::Pending);
        assert_eq!(row.amount, MinorUnits::new(2500));
    }

    #[test]
    fn test_with_changes_applies_only_supplied_fields() {
        let original = installment();
        let changes = InstallmentChanges::new(None, None, Some(InstallmentStatus::Paid)).unwrap();
        let edited = original.with_changes(&changes);

        assert_eq!(edited.status, InstallmentStatus::Paid);
        assert_eq!(edited.amount, original.amount);
        assert_eq!(edited.due_date, original.due_date);
    }

    #[test]
    fn test_empty_changes_rejected() {
        assert!(InstallmentChanges::new(None, None, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_snapshot_shape() {
        let snap = installment().snapshot();
        assert_eq!(snap["id"], 1);
        assert_eq!(snap["invoiceId"], 7);
        assert_eq!(snap["amount"], 2500);
        assert_eq!(snap["status"], "pending");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("overdue".parse::<InstallmentStatus>().unwrap(), InstallmentStatus::Overdue);
        assert!("late".parse::<InstallmentStatus>().is_err());
    }
}
