//! Billing domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors surfaced by payment plan operations
#[derive(Debug, Error)]
pub enum PaymentPlanError {
    /// A required field is missing or malformed. Raised before any write.
    #[error("Validation error on {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The caller lacks the owner/admin role. Raised before any write.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A referenced invoice or installment does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// The ledger failed to read or write
    #[error("Dependency failure: {0}")]
    DependencyFailure(PortError),
}

impl PaymentPlanError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PaymentPlanError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PaymentPlanError::Forbidden(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        PaymentPlanError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PaymentPlanError::Validation { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, PaymentPlanError::Forbidden(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentPlanError::NotFound { .. })
    }
}

impl From<PortError> for PaymentPlanError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => PaymentPlanError::NotFound {
                entity: entity_type,
                id,
            },
            other => PaymentPlanError::DependencyFailure(other),
        }
    }
}
