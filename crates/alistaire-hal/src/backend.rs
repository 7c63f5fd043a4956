//! Backend trait.
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `availability()` | async | yes | `HalResult<BackendAvailability>` |
//! | `validate()` | async | provided | `HalResult<ValidationResult>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | provided | `HalResult<()>` |

use std::sync::Arc;
use std::time::Duration;

use alistaire_ir::JobDescription;
use async_trait::async_trait;

use crate::auth::Credential;
use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// An execution target for job descriptions.
///
/// `capabilities()` must be cached at construction. `submit()` must not
/// block for completion and the job starts in [`JobStatus::Submitted`].
/// `result()` is only valid once `status()` reports `Completed`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &str;

    fn capabilities(&self) -> &Capabilities;

    /// Lightweight liveness check.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Check a job against the backend's limits.
    async fn validate(&self, job: &JobDescription) -> HalResult<ValidationResult> {
        Ok(check_against(self.capabilities(), job))
    }

    /// Submit a job for `shots` repetitions.
    async fn submit(&self, job: &JobDescription, shots: u32) -> HalResult<JobId>;

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a job. Backends without cancellation keep the default.
    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        Err(HalError::CancellationUnsupported(self.name().to_string()))
    }
}

/// Static checks of `job` against `caps`.
pub fn check_against(caps: &Capabilities, job: &JobDescription) -> ValidationResult {
    let mut reasons = Vec::new();

    if job.slot_count() > caps.num_slots {
        reasons.push(format!(
            "job declares {} slots, backend '{}' has {}",
            job.slot_count(),
            caps.name,
            caps.num_slots
        ));
    }
    for op in job.operations() {
        if !caps.supports_operation(op.name()) {
            reasons.push(format!("operation '{}' is not supported", op.name()));
        }
    }
    if let Err(e) = job.validate() {
        reasons.push(e.to_string());
    }

    if reasons.is_empty() {
        ValidationResult::Valid
    } else {
        reasons.dedup();
        ValidationResult::Invalid { reasons }
    }
}

/// Backend availability information.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Whether the backend is currently accepting jobs.
    pub is_available: bool,
    /// Number of jobs currently in queue (if known).
    pub queue_depth: Option<u32>,
    /// Estimated wait time for a new job (if known).
    pub estimated_wait: Option<Duration>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Zero queue, zero wait.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            estimated_wait: Some(Duration::ZERO),
            status_message: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            estimated_wait: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Result of validating a job against a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid { reasons: Vec<String> },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Turns a credential and a backend identifier into a live backend.
///
/// Connectors are what a [`BackendRegistry`](crate::registry::BackendRegistry)
/// stores; they perform whatever authentication the backend needs.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(
        &self,
        credential: &Credential,
        backend_id: &str,
    ) -> HalResult<Arc<dyn Backend>>;
}
