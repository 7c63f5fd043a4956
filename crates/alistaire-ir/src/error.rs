//! Error types for the IR crate.

use crate::slot::SlotId;
use thiserror::Error;

/// Errors raised while building or validating a job description.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A job must address at least one slot.
    #[error("Job must declare at least one slot")]
    NoSlots,

    /// An operation targets a slot outside `[0, slot_count)`.
    #[error("Operation '{operation}' targets {slot} but the job only has {slot_count} slots")]
    SlotOutOfRange {
        /// Name of the offending operation.
        operation: String,
        /// The out-of-range slot.
        slot: SlotId,
        /// Declared slot count of the job.
        slot_count: u32,
    },

    /// An operation was given the wrong number of targets.
    #[error("Operation '{operation}' requires {expected} targets, got {got}")]
    ArityMismatch {
        /// Name of the operation.
        operation: String,
        /// Expected number of targets.
        expected: usize,
        /// Actual number of targets.
        got: usize,
    },

    /// The same slot appears twice among one operation's targets.
    #[error("Operation '{operation}' targets {slot} more than once")]
    DuplicateTarget {
        /// Name of the operation.
        operation: String,
        /// The repeated slot.
        slot: SlotId,
    },

    /// An operation was given the wrong number of angle parameters.
    #[error("Operation '{operation}' takes {expected} parameters, got {got}")]
    ParameterMismatch {
        /// Name of the operation.
        operation: String,
        /// Expected parameter count.
        expected: usize,
        /// Actual parameter count.
        got: usize,
    },

    /// An angle parameter is NaN or infinite.
    #[error("Operation '{operation}' has a non-finite parameter")]
    NonFiniteParameter {
        /// Name of the operation.
        operation: String,
    },

    /// Unknown operation name.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The job was already submitted and can no longer change.
    #[error("Job description is sealed after submission")]
    Sealed,

    /// Malformed textual operation.
    #[error("Cannot parse operation '{input}': {reason}")]
    Parse {
        /// The text that failed to parse.
        input: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
