//! Error types for the HAL crate.

use std::fmt;

use alistaire_ir::IrError;
use thiserror::Error;

/// Errors that can occur in HAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Caller error detected locally; never retried.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Credential missing, invalid or expired.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Backend cannot be resolved or reached right now.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Job description malformed or rejected by the backend.
    #[error("Job submission failed: {0}")]
    Submission(String),

    /// Remote execution failed; carries the backend diagnostic.
    #[error("Job failed: {0}")]
    Execution(String),

    /// The job did not reach a terminal state in time.
    #[error("Timeout waiting for job {0}")]
    TimeoutExceeded(String),

    /// Backend response violates the result contract.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Backend cannot cancel jobs.
    #[error("Cancellation not supported by backend {0}")]
    CancellationUnsupported(String),

    /// Job was cancelled before completing.
    #[error("Job cancelled: {0}")]
    JobCancelled(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HalError {
    /// Whether the caller may reasonably retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HalError::BackendUnavailable(_) | HalError::TimeoutExceeded(_)
        )
    }
}

impl From<IrError> for HalError {
    fn from(e: IrError) -> Self {
        HalError::InvalidConfiguration(e.to_string())
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

/// Dispatcher operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOp {
    BuildJob,
    AddOperation,
    FinalizeObservation,
    ResolveBackend,
    Submit,
    AwaitResult,
    Cancel,
}

impl DispatchOp {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DispatchOp::BuildJob => "build_job",
            DispatchOp::AddOperation => "add_operation",
            DispatchOp::FinalizeObservation => "finalize_observation",
            DispatchOp::ResolveBackend => "resolve_backend",
            DispatchOp::Submit => "submit",
            DispatchOp::AwaitResult => "await_result",
            DispatchOp::Cancel => "cancel",
        }
    }
}

impl fmt::Display for DispatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A [`HalError`] annotated with the dispatcher operation and backend.
#[derive(Debug, Error)]
#[error("{operation} failed on {}: {source}", format_backend(.backend))]
pub struct DispatchError {
    /// Operation that failed.
    pub operation: DispatchOp,
    /// Backend identifier, `None` for purely local operations.
    pub backend: Option<String>,
    /// Underlying error.
    #[source]
    pub source: HalError,
}

fn format_backend(backend: &Option<String>) -> String {
    match backend {
        Some(name) => format!("'{name}'"),
        None => "local".to_string(),
    }
}

impl DispatchError {
    /// Wrap `source` with its context.
    pub fn new(operation: DispatchOp, backend: Option<&str>, source: impl Into<HalError>) -> Self {
        Self {
            operation,
            backend: backend.map(str::to_string),
            source: source.into(),
        }
    }

    /// The underlying error.
    pub fn kind(&self) -> &HalError {
        &self.source
    }

    /// See [`HalError::is_retryable`].
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_names_operation_and_backend() {
        let err = DispatchError::new(
            DispatchOp::Submit,
            Some("ibmq_qasm_simulator"),
            HalError::Submission("rejected".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("submit"));
        assert!(msg.contains("ibmq_qasm_simulator"));
        assert!(msg.contains("rejected"));
    }

    #[test]
    fn test_local_error_display() {
        let err = DispatchError::new(DispatchOp::BuildJob, None, IrError::NoSlots);
        let msg = err.to_string();
        assert!(msg.starts_with("build_job failed on local"));
        assert!(matches!(err.kind(), HalError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_retryable_taxonomy() {
        assert!(HalError::BackendUnavailable("x".into()).is_retryable());
        assert!(HalError::TimeoutExceeded("j".into()).is_retryable());
        assert!(!HalError::Authentication("x".into()).is_retryable());
        assert!(!HalError::Protocol("x".into()).is_retryable());
        assert!(!HalError::InvalidConfiguration("x".into()).is_retryable());
        assert!(!HalError::Execution("x".into()).is_retryable());
    }
}
