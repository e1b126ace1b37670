//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the payment plan domain.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{ClientId, Currency, InvoiceId, MinorUnits, UserId};
use domain_billing::{Caller, Client, Invoice, InvoiceStatus, Role};

/// Fixture for dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Midnight UTC on the given day of January 2025
    pub fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
    }

    /// The instant tests treat as "now" unless they say otherwise
    pub fn now() -> DateTime<Utc> {
        Self::jan(15)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::new(7)
    }

    pub fn client_id() -> ClientId {
        ClientId::new(1)
    }

    pub fn unknown_invoice_id() -> InvoiceId {
        InvoiceId::new(9999)
    }
}

/// Fixture for callers with each role
pub struct CallerFixtures;

impl CallerFixtures {
    pub const ADMIN: Caller = Caller {
        user_id: UserId::new(1),
        role: Role::Admin,
    };
    pub const OWNER: Caller = Caller {
        user_id: UserId::new(2),
        role: Role::Owner,
    };
    pub const MEMBER: Caller = Caller {
        user_id: UserId::new(3),
        role: Role::Member,
    };
    pub const CLIENT: Caller = Caller {
        user_id: UserId::new(4),
        role: Role::Client,
    };

    /// Display name and email registered for a fixture caller
    pub fn profile(caller: &Caller) -> (String, String) {
        let name = match caller.role {
            Role::Admin => "Ada Admin",
            Role::Owner => "Olu Owner",
            Role::Member => "Mo Member",
            Role::Client => "Cy Client",
        };
        let email = format!("{}@meraki.test", caller.role);
        (name.to_string(), email)
    }
}

/// Fixture for invoices and their clients
pub struct InvoiceFixtures;

impl InvoiceFixtures {
    /// A sent USD invoice for 100.00 with a payment link
    pub fn sent_usd() -> Invoice {
        Invoice {
            id: IdFixtures::invoice_id(),
            client_id: IdFixtures::client_id(),
            total: MinorUnits::new(10000),
            currency: Currency::USD,
            due_date: TemporalFixtures::jan(31),
            status: InvoiceStatus::Sent,
            payment_link: Some("https://pay.example/inv-7".to_string()),
            paid_at: None,
        }
    }

    pub fn globex() -> Client {
        Client {
            id: IdFixtures::client_id(),
            name: "Globex".to_string(),
            email: "accounts@globex.test".to_string(),
        }
    }
}
