//! Alistaire Backend Abstraction
//!
//! This crate hides the asynchronous, slow and possibly failing nature of an
//! execution backend behind a small contract:
//! - a common [`Backend`] trait for job submission and management
//! - [`Capabilities`] describing slot and shot limits
//! - [`Credential`] and [`TokenProvider`] for authentication
//! - a [`BackendRegistry`] resolving backend identifiers through connectors
//! - the [`Dispatcher`], which builds, submits and awaits jobs and returns a
//!   validated [`OutcomeDistribution`]
//!
//! # Supported Backends
//!
//! | Backend | Crate | Authentication |
//! |---------|-------|----------------|
//! | Local Simulator | `alistaire-adapter-sim` | Any non-empty token |
//! | Remote REST service | `alistaire-adapter-remote` | Bearer token |
//!
//! # Example: Running a Bell Job
//!
//! ```ignore
//! use std::time::Duration;
//! use alistaire_adapter_sim::SimulatorConnector;
//! use alistaire_hal::{BackendRegistry, Credential, Dispatcher};
//! use alistaire_ir::{OperationKind, SlotId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut registry = BackendRegistry::new();
//!     registry.register("simulator", SimulatorConnector::new());
//!     let dispatcher = Dispatcher::new(registry);
//!
//!     let mut job = dispatcher.build_job(2)?;
//!     dispatcher.add_operation(&mut job, OperationKind::H, [SlotId(0)])?;
//!     dispatcher.add_operation(&mut job, OperationKind::CX, [SlotId(0), SlotId(1)])?;
//!     dispatcher.finalize_observation(&mut job)?;
//!
//!     let credential = Credential::new("local");
//!     let backend = dispatcher.resolve_backend(&credential, "simulator").await?;
//!     let mut handle = dispatcher.submit(&backend, &mut job, 1024).await?;
//!     let distribution = dispatcher.await_result(&mut handle, Duration::from_secs(30)).await?;
//!
//!     for (label, count) in distribution.iter() {
//!         println!("{label}: {count}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use alistaire_hal::{
//!     Backend, BackendAvailability, Capabilities, ExecutionResult, HalResult, JobId, JobStatus,
//! };
//! use alistaire_ir::JobDescription;
//! use async_trait::async_trait;
//!
//! struct MyBackend {
//!     capabilities: Capabilities,
//! }
//!
//! #[async_trait]
//! impl Backend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn availability(&self) -> HalResult<BackendAvailability> {
//!         Ok(BackendAvailability::always_available())
//!     }
//!
//!     async fn submit(&self, job: &JobDescription, shots: u32) -> HalResult<JobId> {
//!         # todo!()
//!     }
//!
//!     async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
//!         # todo!()
//!     }
//!
//!     async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod backoff;
pub mod capability;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use auth::{Credential, EnvTokenProvider, StaticTokenProvider, TokenProvider};
pub use backend::{Backend, BackendAvailability, BackendConnector, ValidationResult};
pub use backoff::{Backoff, PollPolicy};
pub use capability::Capabilities;
pub use dispatch::{Dispatcher, JobHandle};
pub use error::{DispatchError, DispatchOp, DispatchResult, HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, ExecutionResult, OutcomeDistribution};
