//! HookEngine - Concurrent, fail-open execution of hook callbacks
//!
//! The engine is responsible for:
//! - Running every callback of a group concurrently under one shared deadline
//! - Turning timeouts, errors and panics into empty outputs
//! - Dispatching all matching groups for an event in registration order
//!
//! Output order always follows input order, never completion order.

use futures_util::future::join_all;
use hookgate_types::HookOutput;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinError};
use tokio_util::sync::CancellationToken;

use super::diagnostics::{HookDiagnostics, LogDiagnostics};
use super::types::{
    BoxedCallback, CallbackGroup, ExecutionContext, HookError, HookInvocation, SlotReport,
    SlotStatus,
};
use crate::config::HookEngineConfig;

/// Budget used when neither the caller nor the group sets one
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Aborts a spawned task when dropped, so nothing spawned by a call outlives it
/// (including when the caller drops the call's future).
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Cancels the batch signal when the deadline passes
fn arm_deadline(signal: CancellationToken, timeout: Duration) -> AbortOnDrop {
    let timer = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        signal.cancel();
    });
    AbortOnDrop(timer.abort_handle())
}

enum Settled {
    Output(HookOutput),
    Failed(HookError),
    TimedOut,
}

fn join_error_to_hook_error(err: JoinError) -> HookError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        HookError::Panicked(message)
    } else {
        HookError::Failed(err.to_string())
    }
}

/// Executes hook callbacks. Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct HookEngine {
    default_timeout: Duration,
    diagnostics: Arc<dyn HookDiagnostics>,
}

impl HookEngine {
    /// Create an engine with the 60s default budget and log diagnostics
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            diagnostics: Arc::new(LogDiagnostics),
        }
    }

    pub fn from_config(config: &HookEngineConfig) -> Self {
        Self::new().with_default_timeout(config.default_timeout())
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn HookDiagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `callbacks` concurrently and return one output per callback, in order.
    ///
    /// Never fails: a callback that errors, panics, or outlives `timeout`
    /// contributes `{}` to its slot.
    pub async fn invoke(
        &self,
        callbacks: &[BoxedCallback],
        invocation: &HookInvocation,
        timeout: Duration,
    ) -> Vec<HookOutput> {
        self.invoke_detailed(callbacks, invocation, timeout)
            .await
            .into_iter()
            .map(|report| report.output)
            .collect()
    }

    /// Same as [`invoke`](Self::invoke), keeping how each slot settled
    pub async fn invoke_detailed(
        &self,
        callbacks: &[BoxedCallback],
        invocation: &HookInvocation,
        timeout: Duration,
    ) -> Vec<SlotReport> {
        if callbacks.is_empty() {
            return Vec::new();
        }

        let signal = CancellationToken::new();
        let _deadline = arm_deadline(signal.clone(), timeout);
        let ctx = Arc::new(ExecutionContext::new(
            signal,
            invocation.agent.clone(),
            invocation.retry_attempt,
        ));

        log::debug!(
            "[HOOKS] Invoking {} callbacks (timeout {}ms, retry attempt {})",
            callbacks.len(),
            timeout.as_millis(),
            invocation.retry_attempt
        );

        let slots = callbacks
            .iter()
            .map(|callback| self.run_slot(callback.clone(), invocation, ctx.clone(), timeout));

        join_all(slots).await
    }

    async fn run_slot(
        &self,
        callback: BoxedCallback,
        invocation: &HookInvocation,
        ctx: Arc<ExecutionContext>,
        timeout: Duration,
    ) -> SlotReport {
        let callback_id = callback.id().to_string();
        let signal = ctx.signal.clone();
        let input = invocation.input.clone();
        let correlation_id = invocation.correlation_id.clone();
        let start = Instant::now();

        let mut task = tokio::spawn(async move { callback.call(input, correlation_id, ctx).await });
        let _task_guard = AbortOnDrop(task.abort_handle());

        let settled = tokio::select! {
            biased;
            joined = &mut task => match joined {
                Ok(Ok(output)) => Settled::Output(output),
                Ok(Err(e)) => Settled::Failed(e),
                Err(e) => Settled::Failed(join_error_to_hook_error(e)),
            },
            _ = tokio::time::sleep(timeout) => Settled::TimedOut,
            _ = signal.cancelled() => Settled::TimedOut,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        let (output, status) = match settled {
            Settled::Output(output) => (output, SlotStatus::Completed),
            Settled::Failed(e) => {
                self.diagnostics.callback_failed(&callback_id, &e);
                (HookOutput::empty(), SlotStatus::Failed(e.to_string()))
            }
            Settled::TimedOut => {
                // The slot's own timer can win the race against the deadline
                // timer, so set the shared signal here too. A late result is
                // discarded either way.
                signal.cancel();
                task.abort();
                self.diagnostics.callback_timed_out(&callback_id, timeout);
                (HookOutput::empty(), SlotStatus::TimedOut)
            }
        };

        log::debug!(
            "[HOOKS] Hook {} settled in {}ms: {:?}",
            callback_id,
            elapsed_ms,
            status
        );

        SlotReport {
            callback_id,
            output,
            status,
            elapsed_ms,
        }
    }

    /// Invoke every group matching `event_name`, in registration order.
    ///
    /// Groups run one after another; callbacks within a group run concurrently.
    /// Non-matching groups contribute nothing.
    pub async fn dispatch(
        &self,
        groups: &[CallbackGroup],
        event_name: &str,
        invocation: &HookInvocation,
    ) -> Vec<HookOutput> {
        self.dispatch_detailed(groups, event_name, invocation)
            .await
            .into_iter()
            .map(|report| report.output)
            .collect()
    }

    pub async fn dispatch_detailed(
        &self,
        groups: &[CallbackGroup],
        event_name: &str,
        invocation: &HookInvocation,
    ) -> Vec<SlotReport> {
        let mut reports = Vec::new();

        for group in groups {
            if !group.matches(event_name) {
                continue;
            }
            let timeout = group.timeout().unwrap_or(self.default_timeout);
            reports.extend(self.invoke_detailed(group.callbacks(), invocation, timeout).await);
        }

        reports
    }
}

impl Default for HookEngine {
    fn default() -> Self {
        Self::new()
    }
}
