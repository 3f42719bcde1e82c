//! Diagnostics sink for callbacks that time out or fail
//!
//! The engine never surfaces these conditions to the caller; it reports them
//! here instead. Timeouts and failures are kept as separate categories.

use parking_lot::Mutex;
use std::time::Duration;

use super::types::HookError;

/// Receives fail-open diagnostics from the engine
pub trait HookDiagnostics: Send + Sync {
    /// A callback did not settle within its budget
    fn callback_timed_out(&self, callback_id: &str, timeout: Duration);

    /// A callback returned an error or panicked
    fn callback_failed(&self, callback_id: &str, error: &HookError);
}

/// Default sink writing through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl HookDiagnostics for LogDiagnostics {
    fn callback_timed_out(&self, callback_id: &str, timeout: Duration) {
        log::warn!(
            "[HOOKS] Hook {} timed out after {}ms, continuing with empty output",
            callback_id,
            timeout.as_millis()
        );
    }

    fn callback_failed(&self, callback_id: &str, error: &HookError) {
        log::warn!(
            "[HOOKS] Hook {} error (continuing with empty output): {}",
            callback_id,
            error
        );
    }
}

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    TimedOut { callback_id: String, timeout_ms: u64 },
    Failed { callback_id: String, error: String },
}

/// Sink that keeps diagnostics in memory, for runtimes that surface them later
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn timeouts(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|d| matches!(d, Diagnostic::TimedOut { .. }))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|d| matches!(d, Diagnostic::Failed { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl HookDiagnostics for MemoryDiagnostics {
    fn callback_timed_out(&self, callback_id: &str, timeout: Duration) {
        self.entries.lock().push(Diagnostic::TimedOut {
            callback_id: callback_id.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        });
    }

    fn callback_failed(&self, callback_id: &str, error: &HookError) {
        self.entries.lock().push(Diagnostic::Failed {
            callback_id: callback_id.to_string(),
            error: error.to_string(),
        });
    }
}
