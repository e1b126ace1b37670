//! Mail error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors raised while building or delivering a notice
#[derive(Debug, Error)]
pub enum MailError {
    /// The relay or sender settings are unusable
    #[error("Mail configuration error: {0}")]
    Configuration(String),

    /// The recipient address could not be parsed
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The relay rejected the message or could not be reached
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    /// The relay did not answer a connection test
    #[error("SMTP connection test failed: {0}")]
    Connection(String),
}

impl From<MailError> for PortError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::InvalidRecipient(message) => PortError::Validation {
                message,
                field: Some("to".to_string()),
            },
            MailError::Connection(_) | MailError::SendFailed(_) => PortError::ServiceUnavailable {
                service: "smtp".to_string(),
            },
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_failures_are_transient() {
        let port: PortError = MailError::SendFailed("421".to_string()).into();
        assert!(port.is_transient());
    }

    #[test]
    fn test_bad_recipient_is_validation() {
        let port: PortError = MailError::InvalidRecipient("nobody".to_string()).into();
        assert!(matches!(port, PortError::Validation { .. }));
        assert!(!port.is_transient());
    }
}
