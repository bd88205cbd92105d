//! Error types for the bridge
//!
//! Caller contract violations and payload problems are reported through
//! `BridgeError`. Transport-level failures never surface here: once an entry
//! is forwarded, delivery is the backend's concern.

// ----------------------------------------------------------------------------
// Bridge Error
// ----------------------------------------------------------------------------

/// Errors reported by the bridge facade and its payload helpers
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("A response listener is required to send request '{request}'")]
    MissingResponseListener { request: String },

    #[error("Invalid {kind} name: names must not be empty")]
    InvalidName { kind: &'static str },

    #[error("Invalid identifier: {value}")]
    InvalidIdentifier { value: String },

    #[error("Bridge is already ready")]
    AlreadyReady,

    /// Readiness channel communication error
    #[error("Channel error: {message}")]
    Channel { message: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("{record} is missing required field '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl BridgeError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        BridgeError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        BridgeError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a missing-response-listener error for the named request
    pub fn missing_response_listener<T: Into<String>>(request: T) -> Self {
        BridgeError::MissingResponseListener {
            request: request.into(),
        }
    }

    /// Create a missing required field error
    pub fn missing_field(record: &'static str, field: &'static str) -> Self {
        BridgeError::MissingField { record, field }
    }

    /// Whether this error is a caller contract violation rather than a data problem
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            BridgeError::MissingResponseListener { .. }
                | BridgeError::InvalidName { .. }
                | BridgeError::AlreadyReady
        )
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, BridgeError>;
pub type BridgeResult<T> = Result<T>;
