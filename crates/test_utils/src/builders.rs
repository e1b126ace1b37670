//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use core_kernel::{InstallmentId, InvoiceId, MinorUnits, PaymentId};
use domain_billing::ports::mock::InMemoryLedger;
use domain_billing::{Client, Installment, InstallmentStatus, Invoice, Payment};

use crate::fixtures::{CallerFixtures, IdFixtures, InvoiceFixtures, TemporalFixtures};

/// Builder for installments used by the pure planner
pub struct InstallmentBuilder {
    id: InstallmentId,
    invoice_id: InvoiceId,
    due_date: DateTime<Utc>,
    amount: MinorUnits,
    status: InstallmentStatus,
}

impl Default for InstallmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallmentBuilder {
    /// A pending 50.00 installment due on 10 January
    pub fn new() -> Self {
        Self {
            id: InstallmentId::new(1),
            invoice_id: IdFixtures::invoice_id(),
            due_date: TemporalFixtures::jan(10),
            amount: MinorUnits::new(5000),
            status: InstallmentStatus::Pending,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = InstallmentId::new(id);
        self
    }

    pub fn with_invoice_id(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = invoice_id;
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = MinorUnits::new(amount);
        self
    }

    pub fn status(mut self, status: InstallmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Installment {
        Installment {
            id: self.id,
            invoice_id: self.invoice_id,
            due_date: self.due_date,
            amount: self.amount,
            status: self.status,
        }
    }
}

/// Builds a payment with the given id, amount and date against the fixture invoice
pub fn payment(id: i64, amount: i64, date: DateTime<Utc>) -> Payment {
    Payment {
        id: PaymentId::new(id),
        invoice_id: IdFixtures::invoice_id(),
        amount: MinorUnits::new(amount),
        date,
        method: None,
        note: None,
    }
}

/// Builder for an in-memory ledger holding one invoice and its schedule
///
/// # Example
///
/// ```rust,ignore
/// let seeded = LedgerScenario::new()
///     .installment(TemporalFixtures::jan(10), 5000)
///     .installment(TemporalFixtures::jan(20), 5000)
///     .payment(5000, TemporalFixtures::jan(5))
///     .seed()
///     .await;
/// ```
pub struct LedgerScenario {
    invoice: Invoice,
    client: Option<Client>,
    installments: Vec<(DateTime<Utc>, i64, InstallmentStatus)>,
    payments: Vec<(i64, DateTime<Utc>)>,
}

impl Default for LedgerScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerScenario {
    pub fn new() -> Self {
        Self {
            invoice: InvoiceFixtures::sent_usd(),
            client: Some(InvoiceFixtures::globex()),
            installments: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn with_invoice(mut self, invoice: Invoice) -> Self {
        self.invoice = invoice;
        self
    }

    /// Leaves the invoice without a client row
    pub fn without_client(mut self) -> Self {
        self.client = None;
        self
    }

    /// Adds a pending installment
    pub fn installment(self, due_date: DateTime<Utc>, amount: i64) -> Self {
        self.installment_with_status(due_date, amount, InstallmentStatus::Pending)
    }

    pub fn installment_with_status(
        mut self,
        due_date: DateTime<Utc>,
        amount: i64,
        status: InstallmentStatus,
    ) -> Self {
        self.installments.push((due_date, amount, status));
        self
    }

    pub fn payment(mut self, amount: i64, date: DateTime<Utc>) -> Self {
        self.payments.push((amount, date));
        self
    }

    /// Creates the ledger, registering the fixture callers as users
    pub async fn seed(self) -> SeededLedger {
        let ledger = Arc::new(InMemoryLedger::new());
        let invoice_id = self.invoice.id;
        ledger.insert_invoice(self.invoice, self.client).await;

        for caller in [
            CallerFixtures::ADMIN,
            CallerFixtures::OWNER,
            CallerFixtures::MEMBER,
            CallerFixtures::CLIENT,
        ] {
            let (name, email) = CallerFixtures::profile(&caller);
            ledger.insert_user(caller.user_id, name, email).await;
        }

        let mut installments = Vec::with_capacity(self.installments.len());
        for (due_date, amount, status) in self.installments {
            installments.push(ledger.seed_installment(invoice_id, due_date, amount, status).await);
        }
        for (amount, date) in self.payments {
            ledger.seed_payment(invoice_id, amount, date).await;
        }

        SeededLedger {
            ledger,
            invoice_id,
            installments,
        }
    }
}

/// A seeded ledger plus the rows it was seeded with
pub struct SeededLedger {
    pub ledger: Arc<InMemoryLedger>,
    pub invoice_id: InvoiceId,
    /// Seeded installments, in the order they were added
    pub installments: Vec<Installment>,
}

impl SeededLedger {
    /// Stored statuses of the seeded installments, in seeding order
    pub async fn statuses(&self) -> Vec<InstallmentStatus> {
        let mut statuses = Vec::with_capacity(self.installments.len());
        for seeded in &self.installments {
            if let Some(current) = self.ledger.installment(seeded.id).await {
                statuses.push(current.status);
            }
        }
        statuses
    }
}
