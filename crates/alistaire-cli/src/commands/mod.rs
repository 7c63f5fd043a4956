//! CLI command implementations.

pub mod backends;
pub mod common;
pub mod config;
pub mod launch;
pub mod run;
pub mod version;
