//! Job description builder.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::operation::{Operation, OperationKind};
use crate::slot::SlotId;

/// A declarative computation over a fixed number of slots.
///
/// Operations are kept in insertion order. The description ends with an
/// optional "observe all slots" step, set by [`JobDescription::observe_all`].
/// Once [`sealed`](JobDescription::seal) (which happens on submission) the
/// description rejects any further change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    name: String,
    slot_count: u32,
    operations: Vec<Operation>,
    observe_all: bool,
    #[serde(skip)]
    sealed: bool,
}

impl JobDescription {
    /// Create an empty job over `slot_count` slots.
    pub fn new(slot_count: u32) -> IrResult<Self> {
        if slot_count == 0 {
            return Err(IrError::NoSlots);
        }
        Ok(Self {
            name: "job".to_string(),
            slot_count,
            operations: Vec::new(),
            observe_all: false,
            sealed: false,
        })
    }

    /// Set a human-readable label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Two-slot Bell job: `h(0); cx(0, 1); observe`.
    pub fn bell() -> IrResult<Self> {
        let mut job = Self::new(2)?.with_name("bell");
        job.h(SlotId(0))?;
        job.cx(SlotId(0), SlotId(1))?;
        job.observe_all()?;
        Ok(job)
    }

    /// GHZ job over `n` slots: `h(0)` followed by a chain of links.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut job = Self::new(n)?.with_name(format!("ghz_{n}"));
        job.h(SlotId(0))?;
        for i in 1..n {
            job.cx(SlotId(i - 1), SlotId(i))?;
        }
        job.observe_all()?;
        Ok(job)
    }

    /// Append an operation after checking it against this job.
    pub fn push(&mut self, operation: Operation) -> IrResult<&mut Self> {
        if self.sealed {
            return Err(IrError::Sealed);
        }
        operation.check(self.slot_count)?;
        self.operations.push(operation);
        Ok(self)
    }

    /// Append `kind` applied to `targets`.
    pub fn apply(
        &mut self,
        kind: OperationKind,
        targets: impl IntoIterator<Item = SlotId>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::new(kind, targets))
    }

    /// Apply Hadamard.
    pub fn h(&mut self, slot: SlotId) -> IrResult<&mut Self> {
        self.apply(OperationKind::H, [slot])
    }

    /// Apply Pauli-X.
    pub fn x(&mut self, slot: SlotId) -> IrResult<&mut Self> {
        self.apply(OperationKind::X, [slot])
    }

    /// Apply a Z rotation.
    pub fn rz(&mut self, theta: f64, slot: SlotId) -> IrResult<&mut Self> {
        self.apply(OperationKind::Rz(theta), [slot])
    }

    /// Link `control` to `target` with a controlled-X.
    pub fn cx(&mut self, control: SlotId, target: SlotId) -> IrResult<&mut Self> {
        self.apply(OperationKind::CX, [control, target])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: SlotId, target: SlotId) -> IrResult<&mut Self> {
        self.apply(OperationKind::CZ, [control, target])
    }

    /// Mark every slot for observation at the end of the job.
    ///
    /// Idempotent: a second call leaves the description unchanged, even on a
    /// sealed job.
    pub fn observe_all(&mut self) -> IrResult<&mut Self> {
        if self.observe_all {
            return Ok(self);
        }
        if self.sealed {
            return Err(IrError::Sealed);
        }
        self.observe_all = true;
        Ok(self)
    }

    /// Freeze the description.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the description has been frozen.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Whether the final observation step is present.
    pub fn is_observed(&self) -> bool {
        self.observe_all
    }

    /// Label of the job.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared number of slots.
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Operations in insertion order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations (the observation step is not counted).
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operation has been added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Re-check every invariant; used for descriptions that did not go
    /// through the builder, such as deserialized ones.
    pub fn validate(&self) -> IrResult<()> {
        if self.slot_count == 0 {
            return Err(IrError::NoSlots);
        }
        self.operations
            .iter()
            .try_for_each(|op| op.check(self.slot_count))
    }
}
