//! The job dispatcher.
//!
//! [`Dispatcher`] turns a [`JobDescription`] into an [`OutcomeDistribution`]:
//!
//! ```text
//!   build_job ──→ add_operation* ──→ finalize_observation
//!        resolve_backend ──→ submit ──→ await_result ──→ distribution
//!                                  └──→ cancel
//! ```
//!
//! Every failure is returned as a [`DispatchError`] naming the operation and
//! the backend. Nothing is retried automatically.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alistaire_ir::{JobDescription, OperationKind, SlotId};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::auth::Credential;
use crate::backend::{Backend, ValidationResult};
use crate::backoff::PollPolicy;
use crate::error::{DispatchError, DispatchOp, DispatchResult, HalError};
use crate::job::{JobId, JobStatus};
use crate::registry::BackendRegistry;
use crate::result::OutcomeDistribution;

/// A submitted job.
///
/// Owned by the caller. A handle stays valid after a timed-out
/// [`Dispatcher::await_result`] and may be awaited again.
pub struct JobHandle {
    job_id: JobId,
    backend: Arc<dyn Backend>,
    shots: u32,
    slot_count: u32,
    status: JobStatus,
    submitted_at: DateTime<Utc>,
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("job_id", &self.job_id)
            .field("backend", &self.backend.name())
            .field("shots", &self.shots)
            .field("slot_count", &self.slot_count)
            .field("status", &self.status)
            .field("submitted_at", &self.submitted_at)
            .finish()
    }
}

impl JobHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Last status observed by the dispatcher.
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// Builds, submits and awaits jobs against backends from a registry.
///
/// Holds no per-job state and no locks.
pub struct Dispatcher {
    registry: BackendRegistry,
    policy: PollPolicy,
}

impl Dispatcher {
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Start an empty job over `slot_count` slots.
    pub fn build_job(&self, slot_count: u32) -> DispatchResult<JobDescription> {
        JobDescription::new(slot_count).map_err(|e| DispatchError::new(DispatchOp::BuildJob, None, e))
    }

    /// Append `kind` on `targets`. The job is unchanged on failure.
    pub fn add_operation(
        &self,
        job: &mut JobDescription,
        kind: OperationKind,
        targets: impl IntoIterator<Item = SlotId>,
    ) -> DispatchResult<()> {
        job.apply(kind, targets)
            .map(|_| ())
            .map_err(|e| DispatchError::new(DispatchOp::AddOperation, None, e))
    }

    /// Mark all slots for observation. Idempotent.
    pub fn finalize_observation(&self, job: &mut JobDescription) -> DispatchResult<()> {
        job.observe_all()
            .map(|_| ())
            .map_err(|e| DispatchError::new(DispatchOp::FinalizeObservation, None, e))
    }

    /// Authenticate and resolve a backend that is currently accepting jobs.
    #[instrument(skip(self, credential))]
    pub async fn resolve_backend(
        &self,
        credential: &Credential,
        backend_id: &str,
    ) -> DispatchResult<Arc<dyn Backend>> {
        let ctx = |e: HalError| DispatchError::new(DispatchOp::ResolveBackend, Some(backend_id), e);

        let backend = self.registry.resolve(credential, backend_id).await.map_err(ctx)?;
        let availability = backend.availability().await.map_err(ctx)?;
        if !availability.is_available {
            let reason = availability
                .status_message
                .unwrap_or_else(|| "not accepting jobs".to_string());
            return Err(ctx(HalError::BackendUnavailable(format!(
                "{backend_id}: {reason}"
            ))));
        }

        debug!(
            slots = backend.capabilities().num_slots,
            max_shots = backend.capabilities().max_shots,
            "Resolved backend"
        );
        Ok(backend)
    }

    /// Submit `job` for `shots` repetitions and seal it.
    ///
    /// Everything that can be checked locally is checked before the single
    /// remote call.
    #[instrument(skip(self, backend, job), fields(backend = %backend.name(), slots = job.slot_count()))]
    pub async fn submit(
        &self,
        backend: &Arc<dyn Backend>,
        job: &mut JobDescription,
        shots: u32,
    ) -> DispatchResult<JobHandle> {
        let name = backend.name();
        let ctx = |e: HalError| DispatchError::new(DispatchOp::Submit, Some(name), e);

        if shots == 0 {
            return Err(ctx(HalError::InvalidConfiguration(
                "shots must be positive".into(),
            )));
        }
        if !job.is_observed() {
            return Err(ctx(HalError::Submission(
                "job has no observation step".into(),
            )));
        }
        let max_shots = backend.capabilities().max_shots;
        if shots > max_shots {
            return Err(ctx(HalError::Submission(format!(
                "{shots} shots requested, backend allows at most {max_shots}"
            ))));
        }
        if let ValidationResult::Invalid { reasons } = backend.validate(job).await.map_err(ctx)? {
            return Err(ctx(HalError::Submission(reasons.join("; "))));
        }

        let job_id = backend.submit(job, shots).await.map_err(ctx)?;
        job.seal();
        info!(job_id = %job_id, shots, "Job submitted");

        Ok(JobHandle {
            job_id,
            backend: Arc::clone(backend),
            shots,
            slot_count: job.slot_count(),
            status: JobStatus::Submitted,
            submitted_at: Utc::now(),
        })
    }

    /// Wait up to `timeout` for the job to finish and normalize its result.
    ///
    /// Every backend call and sleep is bounded by the deadline. A zero
    /// timeout is the exception: it polls exactly once and lets that call
    /// (and a result fetch after it) run to completion. A timeout too large
    /// to represent as an instant means no deadline. On
    /// [`HalError::TimeoutExceeded`] the handle can be awaited again.
    #[instrument(skip(self, handle), fields(job_id = %handle.job_id, backend = %handle.backend.name()))]
    pub async fn await_result(
        &self,
        handle: &mut JobHandle,
        timeout: Duration,
    ) -> DispatchResult<OutcomeDistribution> {
        let backend = Arc::clone(&handle.backend);
        let name = backend.name();
        let ctx = |e: HalError| DispatchError::new(DispatchOp::AwaitResult, Some(name), e);
        let timed_out = |id: &JobId| ctx(HalError::TimeoutExceeded(id.to_string()));

        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };
        let mut intervals = self.policy.intervals();
        let mut polls: u32 = 0;

        loop {
            let status = within(deadline, backend.status(&handle.job_id))
                .await
                .ok_or_else(|| timed_out(&handle.job_id))?
                .map_err(ctx)?;
            polls += 1;

            if !handle.status.can_transition_to(&status) {
                return Err(ctx(HalError::Protocol(format!(
                    "job {} moved from {} back to {}",
                    handle.job_id, handle.status, status
                ))));
            }
            if status != handle.status {
                debug!(from = %handle.status, to = %status, "Job status changed");
            }
            handle.status = status.clone();

            match status {
                JobStatus::Completed => {
                    let raw = within(deadline, backend.result(&handle.job_id))
                        .await
                        .ok_or_else(|| timed_out(&handle.job_id))?
                        .map_err(ctx)?;
                    let distribution =
                        OutcomeDistribution::from_execution(&raw, handle.shots, handle.slot_count)
                            .map_err(ctx)?;
                    info!(polls, outcomes = distribution.len(), "Job completed");
                    return Ok(distribution);
                }
                JobStatus::Failed(msg) => {
                    warn!(polls, "Job failed: {}", msg);
                    return Err(ctx(HalError::Execution(msg)));
                }
                JobStatus::Cancelled => {
                    return Err(ctx(HalError::JobCancelled(handle.job_id.to_string())));
                }
                JobStatus::Submitted | JobStatus::Running => {
                    if timeout.is_zero() {
                        return Err(timed_out(&handle.job_id));
                    }
                    let interval = intervals.next().unwrap_or(self.policy.max_interval);
                    let pause = match deadline {
                        Some(at) => {
                            let remaining = at.saturating_duration_since(Instant::now());
                            if remaining.is_zero() {
                                debug!(polls, "Deadline reached");
                                return Err(timed_out(&handle.job_id));
                            }
                            interval.min(remaining)
                        }
                        None => interval,
                    };
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    /// Ask the backend to cancel the job.
    #[instrument(skip(self, handle), fields(job_id = %handle.job_id, backend = %handle.backend.name()))]
    pub async fn cancel(&self, handle: &mut JobHandle) -> DispatchResult<()> {
        let name = handle.backend.name();
        let ctx = |e: HalError| DispatchError::new(DispatchOp::Cancel, Some(name), e);

        if !handle.backend.capabilities().supports_cancel {
            return Err(ctx(HalError::CancellationUnsupported(name.to_string())));
        }
        if handle.status.is_terminal() {
            debug!(status = %handle.status, "Job already finished, nothing to cancel");
            return Ok(());
        }

        handle.backend.cancel(&handle.job_id).await.map_err(ctx)?;
        handle.status = JobStatus::Cancelled;
        info!("Job cancelled");
        Ok(())
    }

    /// Resolve, submit and await in one call.
    pub async fn execute(
        &self,
        credential: &Credential,
        backend_id: &str,
        job: &mut JobDescription,
        shots: u32,
        timeout: Duration,
    ) -> DispatchResult<OutcomeDistribution> {
        let backend = self.resolve_backend(credential, backend_id).await?;
        let mut handle = self.submit(&backend, job, shots).await?;
        self.await_result(&mut handle, timeout).await
    }
}

/// Run `fut` to completion, or until `deadline` passes.
///
/// The future is polled at least once, so a call that is already ready
/// still counts at the deadline.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_job_zero_slots() {
        let dispatcher = Dispatcher::new(BackendRegistry::new());
        let err = dispatcher.build_job(0).unwrap_err();
        assert_eq!(err.operation, DispatchOp::BuildJob);
        assert!(err.backend.is_none());
        assert!(matches!(err.kind(), HalError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_add_operation_out_of_range() {
        let dispatcher = Dispatcher::new(BackendRegistry::new());
        let mut job = dispatcher.build_job(2).unwrap();
        let err = dispatcher
            .add_operation(&mut job, OperationKind::CX, [SlotId(0), SlotId(2)])
            .unwrap_err();
        assert_eq!(err.operation, DispatchOp::AddOperation);
        assert!(matches!(err.kind(), HalError::InvalidConfiguration(_)));
        assert!(job.is_empty());
    }

    #[test]
    fn test_finalize_twice_is_identical() {
        let dispatcher = Dispatcher::new(BackendRegistry::new());
        let mut job = dispatcher.build_job(2).unwrap();
        dispatcher.add_operation(&mut job, OperationKind::H, [SlotId(0)]).unwrap();
        dispatcher.finalize_observation(&mut job).unwrap();
        let once = job.clone();
        dispatcher.finalize_observation(&mut job).unwrap();
        assert_eq!(job, once);
    }

    #[tokio::test]
    async fn test_resolve_unknown_backend() {
        let dispatcher = Dispatcher::new(BackendRegistry::new());
        let err = dispatcher
            .resolve_backend(&Credential::new("token"), "nowhere")
            .await
            .err()
            .unwrap();
        assert_eq!(err.operation, DispatchOp::ResolveBackend);
        assert_eq!(err.backend.as_deref(), Some("nowhere"));
        assert!(err.is_retryable());
    }
}
