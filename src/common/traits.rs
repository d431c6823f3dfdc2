//! Common traits and interfaces
//!
//! The audit stream is the user-visible record of what a run removed or restored.
//! It is a trait so the engine can be driven against any sink.

use std::io::Write;
use std::sync::Mutex;

/// Receives one line per deleted, archived or restored identifier
pub trait AuditSink: Send + Sync {
    fn record(&self, identifier: &str);
}

/// Writes audit lines to stdout
#[derive(Debug, Default)]
pub struct StdoutAudit {
    lock: Mutex<()>,
}

impl StdoutAudit {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for StdoutAudit {
    fn record(&self, identifier: &str) {
        // Keep lines from concurrent workers whole.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", identifier);
    }
}

/// Collects audit lines in memory, in emission order
#[derive(Debug, Default)]
pub struct MemoryAudit {
    lines: Mutex<Vec<String>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, identifier: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.push(identifier.to_string());
    }
}

/// Validatable interface for consistent validation
pub trait Validatable {
    type Error;

    /// Validate the object
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
