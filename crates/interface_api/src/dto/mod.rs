//! Request and response bodies
//!
//! JSON is camelCase on the wire. Amounts are integer minor units.

pub mod payment_plans;
pub mod payments;

use serde::Deserialize;

use core_kernel::InvoiceId;

use crate::error::ApiError;

/// `?invoiceId=` query string shared by the list endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub invoice_id: Option<i64>,
}

impl InvoiceQuery {
    pub fn require(&self) -> Result<InvoiceId, ApiError> {
        self.invoice_id
            .map(InvoiceId::new)
            .ok_or_else(|| ApiError::Validation("Missing invoiceId".to_string()))
    }
}
