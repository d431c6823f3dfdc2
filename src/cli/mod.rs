//! Command line interface module
//!
//! Argument parsing, the validated configuration values handed to the purge
//! engine, and the runner that wires them to a registry client.

pub mod args;
pub mod config;
pub mod runner;

pub use args::{Args, Command};
pub use config::{AuthConfig, FailurePolicy, PurgeConfig, RegistryConfig, UnarchiveConfig};
pub use runner::Runner;
