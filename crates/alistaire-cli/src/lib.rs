//! Alistaire launcher library.
//!
//! Everything the `alistaire` binary does apart from argument parsing:
//! settings, host capabilities, file loaders and the launcher flow.

pub mod error;
pub mod host;
pub mod launcher;
pub mod loaders;
pub mod settings;

pub use error::{LauncherError, LauncherResult};
pub use host::{ConsoleHost, FeedbackChannel, RecordingHost, Renderer, SyncProvider};
pub use launcher::{DemoJob, SIMULATOR_BACKEND, build_dispatcher, configure_terminal, parse_shots, participate};
pub use loaders::{CredentialSource, ModelHandle, load_credential, load_json, load_model, resolve_credential};
pub use settings::Settings;
