//! Notifier that only logs
//!
//! Used when SMTP delivery is disabled so that notices still show up in the
//! service log.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::{InstallmentNotice, NotificationPort};

use crate::templates::EmailTemplate;

#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    template: EmailTemplate,
}

impl LogNotifier {
    pub fn new(template: EmailTemplate) -> Self {
        Self { template }
    }
}

impl DomainPort for LogNotifier {}

#[async_trait]
impl HealthCheckable for LogNotifier {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "log-notifier".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("mail delivery disabled".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl NotificationPort for LogNotifier {
    async fn notify(&self, notice: &InstallmentNotice) -> Result<(), PortError> {
        let email = self.template.render(notice, Utc::now());
        info!(
            to = %email.to,
            subject = %email.subject,
            installment_id = %notice.installment_id,
            event = %notice.event,
            "installment notice (not sent, mail disabled)"
        );
        Ok(())
    }
}
