//! Notice templates
//!
//! Each notice renders to a subject line, a plain text body and a branded
//! HTML body. The HTML embeds the text body under a details table and,
//! when the invoice has one, a pay-now button.

use chrono::{DateTime, Datelike, Utc};

use domain_billing::{InstallmentNotice, NotificationEvent};

/// A notice ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders installment notices under a brand name
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    brand_name: String,
}

impl EmailTemplate {
    pub fn new(brand_name: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
        }
    }

    pub fn brand_name(&self) -> &str {
        &self.brand_name
    }

    /// Renders a notice; `now` only sets the copyright year in the footer
    pub fn render(&self, notice: &InstallmentNotice, now: DateTime<Utc>) -> RenderedEmail {
        let subject = subject(notice);
        let text = text_body(notice);
        let html = self.html_body(notice, &subject, &text, now.year());

        RenderedEmail {
            to: notice.to.clone(),
            subject,
            text,
            html,
        }
    }

    fn html_body(&self, notice: &InstallmentNotice, subject: &str, text: &str, year: i32) -> String {
        let brand = escape_html(&self.brand_name);
        let pay_button = notice
            .payment_link
            .as_deref()
            .map(|link| {
                format!(
                    r#"<a href="{}" style="display: inline-block; background: #3b82f6; color: #fff; text-decoration: none; padding: 12px 28px; border-radius: 6px; font-weight: bold; margin-bottom: 18px;">Pay Now</a>"#,
                    escape_html(link)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<div style="font-family: Arial, sans-serif; background: #f0f4f8; padding: 32px;">
  <div style="max-width: 540px; margin: 0 auto; background: #fff; border-radius: 10px; box-shadow: 0 2px 12px #0002; overflow: hidden;">
    <div style="background: #3b82f6; padding: 28px 0; text-align: center;">
      <h1 style="color: #fff; font-size: 1.7rem; margin: 0; letter-spacing: 1px;">{brand}</h1>
    </div>
    <div style="padding: 36px 28px 24px 28px; color: #222;">
      <h2 style="color: #3b82f6; font-size: 1.25rem; margin-bottom: 18px;">{subject}</h2>
      <p style="font-size: 1.05rem; line-height: 1.7; margin-bottom: 18px;">{lead}</p>
      <table style="width: 100%; font-size: 1rem; margin-bottom: 18px;">
        <tr><td style="color: #888; padding: 4px 0;">Client</td><td style="font-weight: 500;">{client}</td></tr>
        <tr><td style="color: #888; padding: 4px 0;">Invoice #</td><td>{invoice}</td></tr>
        <tr><td style="color: #888; padding: 4px 0;">Due Date</td><td>{due}</td></tr>
        <tr><td style="color: #888; padding: 4px 0;">Amount</td><td>{amount}</td></tr>
      </table>
      {pay_button}
      <p style="margin-top: 18px; font-size: 0.98rem; color: #444;">{text}</p>
    </div>
    <div style="background: #f1f5f9; color: #888; font-size: 0.93rem; text-align: center; padding: 16px 0; border-top: 1px solid #e5e7eb;">
      <p style="margin: 0;">&copy; {year} {brand}. All rights reserved.</p>
    </div>
  </div>
</div>
"#,
            brand = brand,
            subject = escape_html(subject),
            lead = lead(notice.event),
            client = escape_html(&notice.client_name),
            invoice = notice.invoice_id.value(),
            due = short_date(notice.due_date),
            amount = escape_html(&notice.amount.to_string()),
            pay_button = pay_button,
            text = escape_html(text).replace('\n', "<br>"),
            year = year,
        )
    }
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self::new("Meraki Invoicing")
    }
}

pub fn subject(notice: &InstallmentNotice) -> String {
    let invoice = notice.invoice_id.value();
    match notice.event {
        NotificationEvent::New => format!("New Payment Plan Installment for Invoice #{}", invoice),
        NotificationEvent::Updated => {
            format!("Payment Plan Installment Updated for Invoice #{}", invoice)
        }
        NotificationEvent::Overdue => format!("Installment Overdue for Invoice #{}", invoice),
    }
}

pub fn text_body(notice: &InstallmentNotice) -> String {
    let due = short_date(notice.due_date);
    match notice.event {
        NotificationEvent::New => format!(
            "A new installment of {} is scheduled for {}.",
            notice.amount, due
        ),
        NotificationEvent::Updated => format!(
            "An installment of {} is now scheduled for {}. Status: {}",
            notice.amount, due, notice.status
        ),
        NotificationEvent::Overdue => format!(
            "An installment of {} due on {} is now overdue. Please pay as soon as possible.",
            notice.amount, due
        ),
    }
}

fn lead(event: NotificationEvent) -> &'static str {
    match event {
        NotificationEvent::New => "A new payment plan installment has been scheduled.",
        NotificationEvent::Updated => "A payment plan installment has been updated.",
        NotificationEvent::Overdue => {
            "This installment is now <b>overdue</b>. Please pay as soon as possible."
        }
    }
}

/// `M/D/YYYY`, as an English locale prints a date
fn short_date(date: DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::{Currency, InstallmentId, InvoiceId, Money};
    use domain_billing::InstallmentStatus;

    fn notice(event: NotificationEvent) -> InstallmentNotice {
        InstallmentNotice {
            to: "ap@globex.test".to_string(),
            event,
            invoice_id: InvoiceId::new(42),
            installment_id: InstallmentId::new(3),
            client_name: "Globex & Sons".to_string(),
            due_date: Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap(),
            amount: Money::from_minor(12550, Currency::USD),
            status: InstallmentStatus::Pending,
            payment_link: None,
        }
    }

    #[test]
    fn test_subjects_name_the_invoice() {
        assert_eq!(
            subject(&notice(NotificationEvent::Overdue)),
            "Installment Overdue for Invoice #42"
        );
        assert_eq!(
            subject(&notice(NotificationEvent::New)),
            "New Payment Plan Installment for Invoice #42"
        );
        assert_eq!(
            subject(&notice(NotificationEvent::Updated)),
            "Payment Plan Installment Updated for Invoice #42"
        );
    }

    #[test]
    fn test_text_formats_amount_and_date() {
        assert_eq!(
            text_body(&notice(NotificationEvent::New)),
            "A new installment of $125.50 is scheduled for 3/9/2025."
        );
        assert_eq!(
            text_body(&notice(NotificationEvent::Updated)),
            "An installment of $125.50 is now scheduled for 3/9/2025. Status: pending"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
