//! Alistaire Job Description Model
//!
//! This crate holds the declarative description of a computation that the
//! dispatcher submits to a backend: a fixed number of addressable slots, an
//! ordered list of operations over those slots, and a final observation step.
//!
//! # Example: Building a Bell Job
//!
//! ```rust
//! use alistaire_ir::{JobDescription, SlotId};
//!
//! let mut job = JobDescription::new(2).unwrap();
//! job.h(SlotId(0)).unwrap();
//! job.cx(SlotId(0), SlotId(1)).unwrap();
//! job.observe_all().unwrap();
//!
//! assert_eq!(job.slot_count(), 2);
//! assert_eq!(job.len(), 2);
//! assert!(job.is_observed());
//! ```
//!
//! # Operation Syntax
//!
//! Operations can be parsed from a compact textual form:
//!
//! ```rust
//! use alistaire_ir::Operation;
//!
//! let op: Operation = "rx(1.5707963):0".parse().unwrap();
//! assert_eq!(op.name(), "rx");
//!
//! let link: Operation = "cx:0,1".parse().unwrap();
//! assert_eq!(link.targets.len(), 2);
//! ```
//!
//! # Supported Operations
//!
//! | Operation | Slots | Description |
//! |-----------|-------|-------------|
//! | `id` | 1 | Identity |
//! | `x`, `y`, `z` | 1 | Pauli operations |
//! | `h` | 1 | Hadamard |
//! | `s`, `sdg`, `t`, `tdg` | 1 | Phase operations |
//! | `rx`, `ry`, `rz`, `p` | 1 | Rotations (one angle, radians) |
//! | `cx`, `cy`, `cz` | 2 | Controlled operations (linking) |
//! | `swap` | 2 | Exchange two slots |
//! | `ccx`, `cswap` | 3 | Doubly-controlled operations |

pub mod error;
pub mod job;
pub mod operation;
pub mod slot;

pub use error::{IrError, IrResult};
pub use job::JobDescription;
pub use operation::{Operation, OperationKind};
pub use slot::SlotId;
