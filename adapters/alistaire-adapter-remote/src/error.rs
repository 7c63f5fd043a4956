//! Error types for the remote adapter.

use alistaire_hal::HalError;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur when talking to a remote execution service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body does not match the wire contract.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token missing, rejected or expired (401/403).
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Backend identifier unknown to the service.
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Job identifier unknown to the service.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job description rejected (400/422).
    #[error("Job rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Service does not cancel jobs on this backend (405/501).
    #[error("Cancellation not supported by backend {0}")]
    CancelUnsupported(String),

    /// Service URL cannot carry path segments.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl From<RemoteError> for HalError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Http(_) => HalError::BackendUnavailable(e.to_string()),
            RemoteError::Json(_) => HalError::Protocol(e.to_string()),
            RemoteError::Unauthorized { .. } => HalError::Authentication(e.to_string()),
            RemoteError::BackendNotFound(_) => HalError::BackendUnavailable(e.to_string()),
            RemoteError::JobNotFound(id) => HalError::JobNotFound(id),
            RemoteError::Rejected { message, .. } => HalError::Submission(message),
            RemoteError::CancelUnsupported(backend) => HalError::CancellationUnsupported(backend),
            RemoteError::InvalidUrl(_) => HalError::InvalidConfiguration(e.to_string()),
            RemoteError::Api { status, .. } if status >= 500 => {
                HalError::BackendUnavailable(e.to_string())
            }
            RemoteError::Api { .. } => HalError::Protocol(e.to_string()),
        }
    }
}
