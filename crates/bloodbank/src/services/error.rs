use crate::domain::{BloodTypeError, UnknownStatus};
use crate::eligibility::InvalidInput;
use crate::persistence::GatewayError;

/// Error raised by every domain service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or malformed input, detected before any database work.
    #[error("{0}")]
    Validation(String),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    /// No qualifying screening backs the requested donation.
    #[error("{0}")]
    NotEligible(String),
    /// Reference data the service depends on is missing.
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Conflict(String),
    /// The worker running the call panicked or was cancelled.
    #[error("{0}")]
    Internal(String),
    /// A statement failed; the surrounding transaction was rolled back.
    #[error("transaction failed: {0}")]
    Transaction(#[source] GatewayError),
    #[error("database unavailable: {0}")]
    Infrastructure(#[source] GatewayError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable discriminator for API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::NotEligible(_) => "not_eligible",
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Internal(_) => "internal",
            ServiceError::Transaction(_) => "transaction",
            ServiceError::Infrastructure(_) => "infrastructure",
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(value: GatewayError) -> Self {
        if value.is_unavailable() {
            Self::Infrastructure(value)
        } else {
            Self::Transaction(value)
        }
    }
}

impl From<InvalidInput> for ServiceError {
    fn from(value: InvalidInput) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<BloodTypeError> for ServiceError {
    fn from(value: BloodTypeError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<UnknownStatus> for ServiceError {
    fn from(value: UnknownStatus) -> Self {
        Self::Validation(value.to_string())
    }
}
