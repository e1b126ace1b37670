//! Payment DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::InvoiceId;
use domain_billing::{Payment, RecordPayment};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub invoice_id: i64,
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    pub amount: i64,
    #[validate(length(max = 30))]
    pub method: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl From<RecordPaymentRequest> for RecordPayment {
    fn from(request: RecordPaymentRequest) -> Self {
        RecordPayment {
            invoice_id: InvoiceId::new(request.invoice_id),
            amount: request.amount,
            method: request.method,
            note: request.note,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub method: Option<String>,
    pub note: Option<String>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.value(),
            invoice_id: payment.invoice_id.value(),
            amount: payment.amount.value(),
            date: payment.date,
            method: payment.method,
            note: payment.note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_length_is_bounded() {
        let request = RecordPaymentRequest {
            invoice_id: 1,
            amount: 100,
            method: Some("card".to_string()),
            note: Some("x".repeat(501)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let request = RecordPaymentRequest {
            invoice_id: 1,
            amount: -5,
            method: None,
            note: None,
        };
        assert!(request.validate().is_err());
    }
}
