//! Error types for the subscription reconciler

use thiserror::Error;

/// Failure reported by one of the CloudWatch Logs clients.
///
/// The variants separate the outcomes the reconciler treats differently:
/// `LimitExceeded` is tolerated on subscribe, `NotFound` is expected on
/// unsubscribe, everything else is a plain service failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The log group already carries the maximum number of subscription filters
    #[error("subscription filter limit exceeded: {0}")]
    LimitExceeded(String),

    /// The log group or filter does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other service or transport failure
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }
}

/// Errors that abort a reconciliation pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Listing log groups failed part way through pagination
    #[error("failed to list log groups (prefix '{prefix}'): {source}")]
    Directory {
        prefix: String,
        #[source]
        source: ClientError,
    },

    /// Putting a subscription filter failed with something other than a limit error
    #[error("failed to subscribe log group '{log_group}': {source}")]
    Subscribe {
        log_group: String,
        #[source]
        source: ClientError,
    },

    /// The lifecycle request type is not one of Create, Update or Delete
    #[error("unsupported lifecycle request type '{0}'")]
    UnsupportedRequestType(String),

    /// The lifecycle branch panicked; the payload is the panic message
    #[error("lifecycle handler panicked: {0}")]
    Panicked(String),

    /// The lifecycle response could not be delivered to the callback URL
    #[error("failed to deliver lifecycle response: {0}")]
    Callback(String),
}

impl ReconcileError {
    pub fn directory(prefix: &str, source: ClientError) -> Self {
        Self::Directory {
            prefix: prefix.to_string(),
            source,
        }
    }

    pub fn subscribe(log_group: &str, source: ClientError) -> Self {
        Self::Subscribe {
            log_group: log_group.to_string(),
            source,
        }
    }
}

/// Result type alias for ReconcileError
pub type Result<T> = std::result::Result<T, ReconcileError>;
