//! Dispatcher behaviour against a scripted backend.
//!
//! Timing tests run on a paused tokio clock so backoff intervals and
//! deadlines are observed exactly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alistaire_hal::{
    Backend, BackendAvailability, BackendConnector, BackendRegistry, Capabilities, Counts,
    Credential, DispatchOp, Dispatcher, ExecutionResult, HalError, HalResult, JobId, JobStatus,
};
use alistaire_ir::{JobDescription, OperationKind, SlotId};
use async_trait::async_trait;
use tokio::time::Instant;

/// Replays a fixed status sequence; the last entry repeats forever.
struct ScriptedBackend {
    capabilities: Capabilities,
    available: bool,
    statuses: Mutex<VecDeque<JobStatus>>,
    counts: Vec<(&'static str, u64)>,
    submits: AtomicUsize,
    cancels: AtomicUsize,
    polls: Mutex<Vec<Instant>>,
    status_delay: Duration,
    result_delay: Mutex<Duration>,
}

impl ScriptedBackend {
    fn new(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        Self {
            capabilities: Capabilities::simulator("scripted", 4).with_max_shots(10_000),
            available: true,
            statuses: Mutex::new(statuses.into_iter().collect()),
            counts: vec![("00", 512), ("11", 512)],
            submits: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            polls: Mutex::new(Vec::new()),
            status_delay: Duration::ZERO,
            result_delay: Mutex::new(Duration::ZERO),
        }
    }

    fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    fn with_result_delay(self, delay: Duration) -> Self {
        *self.result_delay.lock().unwrap() = delay;
        self
    }

    fn with_counts(mut self, counts: Vec<(&'static str, u64)>) -> Self {
        self.counts = counts;
        self
    }

    fn without_cancel(mut self) -> Self {
        self.capabilities = self.capabilities.with_cancel(false);
        self
    }

    fn offline(mut self) -> Self {
        self.available = false;
        self
    }

    fn poll_offsets(&self, start: Instant) -> Vec<u128> {
        self.polls
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(start).as_millis())
            .collect()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        if self.available {
            Ok(BackendAvailability::always_available())
        } else {
            Ok(BackendAvailability::unavailable("maintenance"))
        }
    }

    async fn submit(&self, _job: &JobDescription, shots: u32) -> HalResult<JobId> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        assert!(shots > 0);
        Ok(JobId::new(format!("job-{n}")))
    }

    async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
        self.polls.lock().unwrap().push(Instant::now());
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap_or(JobStatus::Running))
        }
    }

    async fn result(&self, _job_id: &JobId) -> HalResult<ExecutionResult> {
        let delay = *self.result_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let counts = Counts::from_pairs(self.counts.iter().copied());
        let shots = counts.total_shots() as u32;
        Ok(ExecutionResult::new(counts, shots))
    }

    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one shared scripted backend.
struct Fixed(Arc<ScriptedBackend>);

#[async_trait]
impl BackendConnector for Fixed {
    async fn connect(&self, _: &Credential, _: &str) -> HalResult<Arc<dyn Backend>> {
        Ok(self.0.clone())
    }
}

fn dispatcher_for(backend: &Arc<ScriptedBackend>) -> Dispatcher {
    let mut registry = BackendRegistry::new();
    registry.register("scripted", Fixed(backend.clone()));
    Dispatcher::new(registry)
}

fn bell(dispatcher: &Dispatcher) -> JobDescription {
    let mut job = dispatcher.build_job(2).unwrap();
    dispatcher.add_operation(&mut job, OperationKind::H, [SlotId(0)]).unwrap();
    dispatcher
        .add_operation(&mut job, OperationKind::CX, [SlotId(0), SlotId(1)])
        .unwrap();
    dispatcher.finalize_observation(&mut job).unwrap();
    job
}

fn credential() -> Credential {
    Credential::new("test-token")
}

#[tokio::test(start_paused = true)]
async fn test_bell_job_round_trip() {
    let backend = Arc::new(ScriptedBackend::new([
        JobStatus::Submitted,
        JobStatus::Running,
        JobStatus::Completed,
    ]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();
    assert_eq!(handle.status(), &JobStatus::Submitted);
    assert_eq!(handle.job_id().as_str(), "job-0");

    let dist = dispatcher
        .await_result(&mut handle, Duration::from_secs(10))
        .await
        .unwrap();

    let labels: Vec<_> = dist.iter().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["00", "11"]);
    assert_eq!(dist.total(), 1024);
    assert_eq!(handle.status(), &JobStatus::Completed);
}

#[tokio::test]
async fn test_submit_seals_job() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Completed]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    dispatcher.submit(&resolved, &mut job, 100).await.unwrap();

    assert!(job.is_sealed());
    let err = dispatcher
        .add_operation(&mut job, OperationKind::X, [SlotId(0)])
        .unwrap_err();
    assert!(matches!(err.kind(), HalError::InvalidConfiguration(_)));
    // Finalizing an already observed, sealed job is still a no-op.
    assert!(dispatcher.finalize_observation(&mut job).is_ok());
}

#[tokio::test]
async fn test_zero_timeout_polls_once() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Submitted]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let err = dispatcher
        .await_result(&mut handle, Duration::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err.operation, DispatchOp::AwaitResult);
    assert_eq!(err.backend.as_deref(), Some("scripted"));
    assert!(matches!(err.kind(), HalError::TimeoutExceeded(id) if id == "job-0"));
    assert!(err.is_retryable());
    assert_eq!(backend.polls.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handle_can_be_awaited_again_after_timeout() {
    let backend = Arc::new(ScriptedBackend::new([
        JobStatus::Submitted,
        JobStatus::Running,
        JobStatus::Completed,
    ]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    assert!(dispatcher.await_result(&mut handle, Duration::ZERO).await.is_err());
    let dist = dispatcher
        .await_result(&mut handle, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(dist.shots(), 1024);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_up_to_ceiling() {
    let mut script = vec![JobStatus::Submitted];
    script.extend(std::iter::repeat_n(JobStatus::Running, 8));
    script.push(JobStatus::Completed);
    let backend = Arc::new(ScriptedBackend::new(script));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let start = Instant::now();
    dispatcher
        .await_result(&mut handle, Duration::from_secs(60))
        .await
        .unwrap();

    let offsets = backend.poll_offsets(start);
    let gaps: Vec<u128> = offsets.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(gaps, vec![50, 100, 200, 400, 800, 1600, 2000, 2000, 2000]);
}

#[tokio::test(start_paused = true)]
async fn test_sleep_never_passes_deadline() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Running]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let start = Instant::now();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_millis(300))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), HalError::TimeoutExceeded(_)));
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(backend.poll_offsets(start), vec![0, 50, 150, 300]);
    assert_eq!(handle.status(), &JobStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_slow_status_call_is_bounded_by_deadline() {
    let backend = Arc::new(
        ScriptedBackend::new([JobStatus::Running]).with_status_delay(Duration::from_secs(30)),
    );
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let start = Instant::now();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), HalError::TimeoutExceeded(_)));
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(handle.status(), &JobStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn test_slow_result_fetch_is_bounded_by_deadline() {
    let backend = Arc::new(
        ScriptedBackend::new([JobStatus::Completed]).with_result_delay(Duration::from_secs(30)),
    );
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let start = Instant::now();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), HalError::TimeoutExceeded(_)));
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(handle.status(), &JobStatus::Completed);

    *backend.result_delay.lock().unwrap() = Duration::ZERO;
    let dist = dispatcher
        .await_result(&mut handle, Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(dist.total(), 1024);
}

#[tokio::test(start_paused = true)]
async fn test_unrepresentable_timeout_means_no_deadline() {
    let backend = Arc::new(ScriptedBackend::new([
        JobStatus::Submitted,
        JobStatus::Running,
        JobStatus::Completed,
    ]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();

    let dist = dispatcher
        .await_result(&mut handle, Duration::MAX)
        .await
        .unwrap();
    assert_eq!(dist.total(), 1024);
    assert_eq!(backend.polls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_failed_job_carries_diagnostic() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Failed(
        "calibration drift".into(),
    )]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), HalError::Execution(msg) if msg == "calibration drift"));
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("await_result failed on 'scripted'"));
}

#[tokio::test]
async fn test_cancelled_job() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Cancelled]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), HalError::JobCancelled(_)));
}

#[tokio::test]
async fn test_count_mismatch_is_protocol_error() {
    let backend = Arc::new(
        ScriptedBackend::new([JobStatus::Completed]).with_counts(vec![("00", 500), ("11", 500)]),
    );
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), HalError::Protocol(_)));
}

#[tokio::test]
async fn test_status_regression_is_protocol_error() {
    let backend = Arc::new(ScriptedBackend::new([
        JobStatus::Running,
        JobStatus::Submitted,
    ]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 1024).await.unwrap();
    let err = dispatcher
        .await_result(&mut handle, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), HalError::Protocol(_)));
}

#[tokio::test]
async fn test_zero_shots_rejected_before_remote_call() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Completed]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let err = dispatcher.submit(&resolved, &mut job, 0).await.unwrap_err();

    assert_eq!(err.operation, DispatchOp::Submit);
    assert!(matches!(err.kind(), HalError::InvalidConfiguration(_)));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
    assert!(!job.is_sealed());
}

#[tokio::test]
async fn test_unobserved_job_rejected() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Completed]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = dispatcher.build_job(2).unwrap();
    dispatcher.add_operation(&mut job, OperationKind::H, [SlotId(0)]).unwrap();

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let err = dispatcher.submit(&resolved, &mut job, 10).await.unwrap_err();
    assert!(matches!(err.kind(), HalError::Submission(_)));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_limits_enforced() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Completed]));
    let dispatcher = dispatcher_for(&backend);

    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();

    let mut job = bell(&dispatcher);
    let err = dispatcher.submit(&resolved, &mut job, 20_000).await.unwrap_err();
    assert!(matches!(err.kind(), HalError::Submission(_)));

    let mut wide = JobDescription::ghz(6).unwrap();
    let err = dispatcher.submit(&resolved, &mut wide, 10).await.unwrap_err();
    assert!(matches!(err.kind(), HalError::Submission(msg) if msg.contains("6 slots")));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resolve_rejects_bad_credential_and_offline_backend() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Completed]));
    let dispatcher = dispatcher_for(&backend);
    let err = dispatcher
        .resolve_backend(&Credential::new(""), "scripted")
        .await
        .err()
        .unwrap();
    assert!(matches!(err.kind(), HalError::Authentication(_)));
    assert!(!err.is_retryable());

    let offline = Arc::new(ScriptedBackend::new([JobStatus::Completed]).offline());
    let dispatcher = dispatcher_for(&offline);
    let err = dispatcher
        .resolve_backend(&credential(), "scripted")
        .await
        .err()
        .unwrap();
    assert!(matches!(err.kind(), HalError::BackendUnavailable(msg) if msg.contains("maintenance")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancel() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Running]));
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);
    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 10).await.unwrap();

    dispatcher.cancel(&mut handle).await.unwrap();
    assert_eq!(handle.status(), &JobStatus::Cancelled);
    assert_eq!(backend.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_unsupported() {
    let backend = Arc::new(ScriptedBackend::new([JobStatus::Running]).without_cancel());
    let dispatcher = dispatcher_for(&backend);
    let mut job = bell(&dispatcher);
    let resolved = dispatcher.resolve_backend(&credential(), "scripted").await.unwrap();
    let mut handle = dispatcher.submit(&resolved, &mut job, 10).await.unwrap();

    let err = dispatcher.cancel(&mut handle).await.unwrap_err();
    assert_eq!(err.operation, DispatchOp::Cancel);
    assert!(matches!(err.kind(), HalError::CancellationUnsupported(_)));
    assert_eq!(backend.cancels.load(Ordering::SeqCst), 0);
}
