//! Error types for the simulator adapter.

use alistaire_hal::HalError;
use thiserror::Error;

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the local simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Job needs more slots than the simulator holds in memory.
    #[error("Job has {requested} slots but the simulator supports at most {max}")]
    TooManySlots { requested: u32, max: u32 },

    /// Shot count outside `1..=max`.
    #[error("Shot count {requested} outside 1..={max}")]
    ShotsOutOfRange { requested: u32, max: u32 },

    /// No job with this id was submitted here.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// `result()` called before the job completed.
    #[error("Result of job {0} is not available yet")]
    ResultNotReady(String),

    /// The simulation worker panicked or was aborted.
    #[error("Simulation worker failed: {0}")]
    Worker(String),
}

impl From<SimError> for HalError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::TooManySlots { .. } | SimError::ShotsOutOfRange { .. } => {
                HalError::Submission(e.to_string())
            }
            SimError::JobNotFound(id) => HalError::JobNotFound(id),
            SimError::ResultNotReady(_) | SimError::Worker(_) => HalError::Execution(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_slots_is_submission_error() {
        let err: HalError = SimError::TooManySlots {
            requested: 30,
            max: 20,
        }
        .into();
        assert!(matches!(err, HalError::Submission(ref msg) if msg.contains("30 slots")));
    }

    #[test]
    fn test_job_not_found_keeps_id() {
        let err: HalError = SimError::JobNotFound("abc".into()).into();
        assert!(matches!(err, HalError::JobNotFound(id) if id == "abc"));
    }
}
