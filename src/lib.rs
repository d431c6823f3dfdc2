//! Registry Purger Library
//!
//! Retention for container registries: purge tags older than a given age,
//! sweep manifests no tag points at, and archive manifests into another
//! repository so they can be restored later.

pub mod cli;
pub mod common;
pub mod digest;
pub mod error;
pub mod logging;
pub mod purge;
pub mod registry;

pub use common::traits::{AuditSink, MemoryAudit, StdoutAudit};
pub use error::{PurgeError, Result};
pub use logging::Logger;
pub use purge::{PurgeSummary, Purger};
pub use registry::{RegistryApi, RegistryClient};
