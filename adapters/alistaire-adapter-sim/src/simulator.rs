//! Simulator backend implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use alistaire_hal::{
    Backend, BackendAvailability, BackendConnector, Capabilities, Credential, ExecutionResult,
    HalResult, Job, JobId, JobStatus,
};
use alistaire_ir::JobDescription;

use crate::error::SimError;
use crate::statevector::Statevector;

/// Maximum number of tracked jobs before finished entries are evicted.
const MAX_TRACKED_JOBS: usize = 10_000;

/// Tunables of a simulator instance.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub max_slots: u32,
    pub max_shots: u32,
    /// Time a job spends in `Submitted` before it starts running.
    pub queue_delay: Duration,
    /// Base seed; job `n` on this instance samples with `seed + n`.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_slots: 20,
            max_shots: 100_000,
            queue_delay: Duration::ZERO,
            seed: None,
        }
    }
}

struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

type JobTable = Arc<Mutex<FxHashMap<String, SimJob>>>;

/// Local simulator backend.
///
/// `submit` records the job and returns at once; the statevector work runs
/// on the blocking pool and the job moves through
/// `Submitted → Running → Completed` in the background.
///
/// A job is forgotten once its result has been retrieved. Finished jobs
/// that nobody collects are evicted when the table fills up.
pub struct SimulatorBackend {
    name: String,
    config: SimulatorConfig,
    capabilities: Capabilities,
    jobs: JobTable,
    submitted: AtomicU64,
}

impl SimulatorBackend {
    /// Simulator named `simulator` with default settings.
    pub fn new() -> Self {
        Self::with_config("simulator", SimulatorConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: SimulatorConfig) -> Self {
        let name = name.into();
        let capabilities = Capabilities::simulator(name.clone(), config.max_slots)
            .with_max_shots(config.max_shots);
        Self {
            name,
            config,
            capabilities,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            submitted: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Number of jobs this instance still holds.
    pub fn tracked_jobs(&self) -> usize {
        Self::lock_jobs(&self.jobs).len()
    }

    fn lock_jobs(jobs: &JobTable) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move a job forward; `false` if it was cancelled or removed meanwhile.
    fn advance(jobs: &JobTable, id: &str, status: JobStatus) -> bool {
        Self::lock_jobs(jobs)
            .get_mut(id)
            .is_some_and(|entry| entry.job.advance(status))
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the whole job synchronously.
fn run_simulation(job: &JobDescription, shots: u32, seed: Option<u64>) -> ExecutionResult {
    let start = Instant::now();
    debug!(
        "Starting simulation: {} slots, {} operations, {} shots",
        job.slot_count(),
        job.len(),
        shots
    );

    let mut sv = Statevector::new(job.slot_count() as usize);
    for op in job.operations() {
        sv.apply(op);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let counts = sv.sample_counts(shots, &mut rng);

    let elapsed = start.elapsed();
    debug!("Simulation completed in {:?}", elapsed);

    ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64)
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    #[instrument(skip(self, job), fields(backend = %self.name))]
    async fn submit(&self, job: &JobDescription, shots: u32) -> HalResult<JobId> {
        if job.slot_count() > self.config.max_slots {
            return Err(SimError::TooManySlots {
                requested: job.slot_count(),
                max: self.config.max_slots,
            }
            .into());
        }
        if shots == 0 || shots > self.config.max_shots {
            return Err(SimError::ShotsOutOfRange {
                requested: shots,
                max: self.config.max_shots,
            }
            .into());
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let n = self.submitted.fetch_add(1, Ordering::Relaxed);
        let seed = self.config.seed.map(|s| s.wrapping_add(n));

        {
            let mut jobs = Self::lock_jobs(&self.jobs);
            evict_finished(&mut jobs, MAX_TRACKED_JOBS);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    job: Job::new(job_id.clone(), shots).with_backend(self.name.clone()),
                    result: None,
                },
            );
        }
        debug!("Submitted job: {}", job_id);

        let jobs = Arc::clone(&self.jobs);
        let id = job_id.0.clone();
        let description = job.clone();
        let delay = self.config.queue_delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !Self::advance(&jobs, &id, JobStatus::Running) {
                debug!("Job {} no longer pending, skipping", id);
                return;
            }

            let outcome =
                tokio::task::spawn_blocking(move || run_simulation(&description, shots, seed))
                    .await;

            let mut table = Self::lock_jobs(&jobs);
            let Some(entry) = table.get_mut(&id) else {
                return;
            };
            match outcome {
                Ok(result) => {
                    if entry.job.advance(JobStatus::Completed) {
                        entry.result = Some(result);
                    }
                }
                Err(e) => {
                    warn!("Simulation of job {} failed: {}", id, e);
                    entry
                        .job
                        .advance(JobStatus::Failed(SimError::Worker(e.to_string()).to_string()));
                }
            }
        });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        Self::lock_jobs(&self.jobs)
            .get(&job_id.0)
            .map(|entry| entry.job.status.clone())
            .ok_or_else(|| SimError::JobNotFound(job_id.0.clone()).into())
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = Self::lock_jobs(&self.jobs);
        let ready = jobs
            .get(&job_id.0)
            .ok_or_else(|| SimError::JobNotFound(job_id.0.clone()))?
            .result
            .is_some();
        if !ready {
            return Err(SimError::ResultNotReady(job_id.0.clone()).into());
        }

        debug!("Releasing job: {}", job_id);
        jobs.remove(&job_id.0)
            .and_then(|entry| entry.result)
            .ok_or_else(|| SimError::JobNotFound(job_id.0.clone()).into())
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = Self::lock_jobs(&self.jobs);
        let entry = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| SimError::JobNotFound(job_id.0.clone()))?;
        if entry.job.advance(JobStatus::Cancelled) {
            debug!("Cancelled job: {}", job_id);
        }
        Ok(())
    }
}

/// Drop finished jobs once the table holds `cap` entries.
fn evict_finished(jobs: &mut FxHashMap<String, SimJob>, cap: usize) {
    if jobs.len() < cap {
        return;
    }
    let before = jobs.len();
    jobs.retain(|_, entry| !entry.job.status.is_terminal());
    debug!("Evicted {} finished jobs", before - jobs.len());
}

/// Connects every requested identifier to a fresh simulator instance.
///
/// Any non-empty credential is accepted.
#[derive(Debug, Clone, Default)]
pub struct SimulatorConnector {
    config: SimulatorConfig,
}

impl SimulatorConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendConnector for SimulatorConnector {
    async fn connect(
        &self,
        _credential: &Credential,
        backend_id: &str,
    ) -> HalResult<Arc<dyn Backend>> {
        Ok(Arc::new(SimulatorBackend::with_config(
            backend_id,
            self.config.clone(),
        )))
    }
}
