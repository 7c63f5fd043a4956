//! Backend capability introspection.

use serde::{Deserialize, Serialize};

/// What a backend can run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Backend identifier.
    pub name: String,
    /// Number of slots a job may declare.
    pub num_slots: u32,
    /// Maximum shots per job.
    pub max_shots: u32,
    /// Operation names accepted; empty means "everything in the IR".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_operations: Vec<String>,
    /// Whether this is a simulator (`true`) or a hardware queue.
    pub is_simulator: bool,
    /// Whether jobs can be cancelled after submission.
    pub supports_cancel: bool,
}

impl Capabilities {
    /// Capabilities of a local simulator.
    pub fn simulator(name: impl Into<String>, num_slots: u32) -> Self {
        Self {
            name: name.into(),
            num_slots,
            max_shots: 100_000,
            supported_operations: Vec::new(),
            is_simulator: true,
            supports_cancel: true,
        }
    }

    /// Capabilities of a remote backend as advertised by its service.
    pub fn remote(name: impl Into<String>, num_slots: u32, max_shots: u32) -> Self {
        Self {
            name: name.into(),
            num_slots,
            max_shots,
            supported_operations: Vec::new(),
            is_simulator: false,
            supports_cancel: false,
        }
    }

    pub fn with_operations(mut self, ops: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.supported_operations = ops.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cancel(mut self, supports_cancel: bool) -> Self {
        self.supports_cancel = supports_cancel;
        self
    }

    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Whether operation `name` is accepted.
    pub fn supports_operation(&self, name: &str) -> bool {
        self.supported_operations.is_empty()
            || self.supported_operations.iter().any(|op| op == name)
    }
}
