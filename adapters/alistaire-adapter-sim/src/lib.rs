//! Alistaire Local Statevector Simulator
//!
//! A local backend for testing and small experiments. Jobs are simulated
//! exactly on a statevector and then sampled, so the simulator is limited to
//! around 20 slots.
//!
//! # Features
//!
//! - **Exact simulation**: every operation of `alistaire-ir` is supported
//! - **Asynchronous lifecycle**: `submit` returns immediately, work runs on
//!   the blocking pool
//! - **Reproducible**: an optional seed makes sampling deterministic
//! - **Cancellation**: pending jobs can be cancelled
//!
//! # Memory
//!
//! | Slots | Memory |
//! |-------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//!
//! # Example
//!
//! ```ignore
//! use alistaire_adapter_sim::SimulatorBackend;
//! use alistaire_hal::Backend;
//! use alistaire_ir::JobDescription;
//!
//! let backend = SimulatorBackend::new();
//! let job_id = backend.submit(&JobDescription::bell()?, 1000).await?;
//! ```

mod error;
mod simulator;
mod statevector;

pub use error::{SimError, SimResult};
pub use simulator::{SimulatorBackend, SimulatorConfig, SimulatorConnector};
