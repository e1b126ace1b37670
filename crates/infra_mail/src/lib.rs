//! Mail Infrastructure - Client notices for installment payment plans
//!
//! This crate provides the notification adapters for the billing domain:
//!
//! - [`SmtpNotifier`] renders a branded text and HTML email and delivers it
//!   over an async SMTP relay
//! - [`LogNotifier`] only logs the rendered subject, used when mail is off
//!
//! Both implement [`domain_billing::NotificationPort`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_mail::{notifier_from_config, SmtpConfig};
//!
//! let notifier = notifier_from_config(&SmtpConfig::default())?;
//! ```

pub mod config;
pub mod error;
pub mod log;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use domain_billing::NotificationPort;

pub use config::SmtpConfig;
pub use error::MailError;
pub use log::LogNotifier;
pub use smtp::SmtpNotifier;
pub use templates::{EmailTemplate, RenderedEmail};

/// Builds the SMTP notifier when mail is enabled, the log notifier otherwise
pub fn notifier_from_config(config: &SmtpConfig) -> Result<Arc<dyn NotificationPort>, MailError> {
    if config.enabled {
        Ok(Arc::new(SmtpNotifier::new(config.clone())?))
    } else {
        Ok(Arc::new(LogNotifier::new(EmailTemplate::new(
            config.brand_name.clone(),
        ))))
    }
}
