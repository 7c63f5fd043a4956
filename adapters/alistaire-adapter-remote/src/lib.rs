//! Alistaire Remote Backend Adapter
//!
//! Talks to a remote job service over JSON/HTTPS. Backends are addressed by
//! identifier (for example `ibmq_qasm_simulator`); a [`RemoteConnector`]
//! registered as the registry fallback serves every identifier the service
//! knows.
//!
//! # Example
//!
//! ```ignore
//! use alistaire_adapter_remote::RemoteConnector;
//! use alistaire_hal::{BackendRegistry, Credential, Dispatcher};
//!
//! let mut registry = BackendRegistry::new();
//! registry.set_fallback(RemoteConnector::new("https://jobs.example.com/api/v1"));
//! let dispatcher = Dispatcher::new(registry);
//!
//! let credential = Credential::new(token);
//! let backend = dispatcher.resolve_backend(&credential, "ibmq_qasm_simulator").await?;
//! ```

pub mod api;
mod backend;
mod error;

pub use backend::{RemoteBackend, RemoteConnector};
pub use error::{RemoteError, RemoteResult};
