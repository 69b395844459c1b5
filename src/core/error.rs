//! Error types for the mobile access bridge

use thiserror::Error;

/// Result type for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Failure reported by the access SDK itself
///
/// The message is the SDK's localized description and is passed to callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SdkError {
    pub message: String,
}

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Caller-facing errors of the bridge operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("configure has not been called yet")]
    NotConfigured,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("continuationPoint was not valid")]
    InvalidContinuationPoint,

    #[error("{0}")]
    RegistrationFailed(String),

    #[error("{0}")]
    DeleteFailed(String),

    #[error("SDK contract violation: {0}")]
    ContractViolation(String),
}

impl BridgeError {
    /// Stable error kind string delivered to callers alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::NotConfigured => "not_configured",
            BridgeError::InvalidArgument(_) => "invalid_arg",
            BridgeError::InvalidContinuationPoint => "invalid_continuation_point",
            BridgeError::RegistrationFailed(_) => "registration_failed",
            BridgeError::DeleteFailed(_) => "delete_mobile_credential_failed",
            BridgeError::ContractViolation(_) => "internal_error",
        }
    }

    pub(crate) fn invalid_arg(message: impl Into<String>) -> Self {
        BridgeError::InvalidArgument(message.into())
    }
}

/// Errors related to transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid socket mode: {0}")]
    InvalidSocketMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(BridgeError::NotConfigured.kind(), "not_configured");
        assert_eq!(BridgeError::invalid_arg("url was invalid").kind(), "invalid_arg");
        assert_eq!(
            BridgeError::InvalidContinuationPoint.kind(),
            "invalid_continuation_point"
        );
        assert_eq!(
            BridgeError::RegistrationFailed("offline".into()).kind(),
            "registration_failed"
        );
        assert_eq!(
            BridgeError::DeleteFailed("busy".into()).kind(),
            "delete_mobile_credential_failed"
        );
        assert_eq!(
            BridgeError::ContractViolation("neither".into()).kind(),
            "internal_error"
        );
    }

    #[test]
    fn test_sdk_message_passes_through_verbatim() {
        let sdk = SdkError::new("The Internet connection appears to be offline.");
        let err = BridgeError::RegistrationFailed(sdk.to_string());
        assert_eq!(
            err.to_string(),
            "The Internet connection appears to be offline."
        );
    }
}
