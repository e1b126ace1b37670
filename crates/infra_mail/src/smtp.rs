//! SMTP delivery
//!
//! Notices go out over a STARTTLS relay as multipart/alternative messages
//! carrying both the plain text and the branded HTML body.

use async_trait::async_trait;
use chrono::Utc;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Instant;
use tracing::{info, instrument};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::{InstallmentNotice, NotificationPort};

use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::templates::{EmailTemplate, RenderedEmail};

/// Sends installment notices through an SMTP relay
pub struct SmtpNotifier {
    from: Mailbox,
    template: EmailTemplate,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| MailError::Configuration(format!("Invalid from address: {}", e)))?;

        let creds = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            from,
            template: EmailTemplate::new(config.brand_name),
            transport,
        })
    }

    async fn send(&self, email: RenderedEmail) -> Result<(), MailError> {
        let message = build_message(self.from.clone(), email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

/// Assembles a multipart/alternative message from a rendered notice
pub fn build_message(from: Mailbox, email: RenderedEmail) -> Result<Message, MailError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| MailError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html),
                ),
        )
        .map_err(|e| MailError::Build(e.to_string()))
}

impl DomainPort for SmtpNotifier {}

#[async_trait]
impl HealthCheckable for SmtpNotifier {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let (status, message) = match self.transport.test_connection().await {
            Ok(true) => (AdapterHealth::Healthy, None),
            Ok(false) => (
                AdapterHealth::Degraded,
                Some("relay did not accept the connection test".to_string()),
            ),
            Err(e) => (
                AdapterHealth::Unhealthy,
                Some(MailError::Connection(e.to_string()).to_string()),
            ),
        };

        HealthCheckResult {
            adapter_id: "smtp".to_string(),
            status,
            latency_ms: start.elapsed().as_millis() as u64,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl NotificationPort for SmtpNotifier {
    #[instrument(skip(self, notice), fields(installment_id = %notice.installment_id, event = %notice.event))]
    async fn notify(&self, notice: &InstallmentNotice) -> Result<(), PortError> {
        let email = self.template.render(notice, Utc::now());
        let to = email.to.clone();
        let subject = email.subject.clone();

        self.send(email).await?;

        info!(to = %to, subject = %subject, "installment notice sent");
        Ok(())
    }
}
