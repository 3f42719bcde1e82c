//! Hook types and traits for the concurrent hook engine
//!
//! This module defines the callback trait, the per-batch execution context,
//! callback groups and the bookkeeping types produced by an invocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hookgate_types::HookOutput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::matcher::EventMatcher;

/// Lifecycle points at which the runtime dispatches hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    /// Before the agent starts processing a message
    BeforeAgentStart,
    /// After the agent finishes processing (success or failure)
    AfterAgentEnd,
    /// Before a tool is called
    BeforeToolCall,
    /// After a tool call completes
    AfterToolCall,
    /// When a tool call fails
    OnToolError,
    /// Before a model generation is requested
    BeforeGeneration,
    /// After a model generation completes
    AfterGeneration,
    /// Session started (new conversation)
    SessionStart,
    /// Session ended (conversation complete)
    SessionEnd,
    /// When an error occurs during processing
    OnError,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::BeforeAgentStart => "before_agent_start",
            HookEvent::AfterAgentEnd => "after_agent_end",
            HookEvent::BeforeToolCall => "before_tool_call",
            HookEvent::AfterToolCall => "after_tool_call",
            HookEvent::OnToolError => "on_tool_error",
            HookEvent::BeforeGeneration => "before_generation",
            HookEvent::AfterGeneration => "after_generation",
            HookEvent::SessionStart => "session_start",
            HookEvent::SessionEnd => "session_end",
            HookEvent::OnError => "on_error",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by hook callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The callback reported a failure
    Failed(String),
    /// The callback task panicked
    Panicked(String),
}

impl HookError {
    pub fn failed(message: impl Into<String>) -> Self {
        HookError::Failed(message.into())
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::Failed(msg) => write!(f, "Hook failed: {}", msg),
            HookError::Panicked(msg) => write!(f, "Hook panicked: {}", msg),
        }
    }
}

impl std::error::Error for HookError {}

impl From<String> for HookError {
    fn from(s: String) -> Self {
        HookError::Failed(s)
    }
}

impl From<&str> for HookError {
    fn from(s: &str) -> Self {
        HookError::Failed(s.to_string())
    }
}

/// Opaque reference to the owning session or agent, passed through untouched
pub type AgentRef = Arc<dyn Any + Send + Sync>;

/// Read-only context shared by every callback of one invocation batch.
///
/// The signal is cancelled once the batch deadline passes and stays cancelled.
/// Callbacks that poll it can stop early; callbacks that ignore it are still
/// cut off by the engine at the same deadline.
pub struct ExecutionContext {
    pub signal: CancellationToken,
    pub agent: Option<AgentRef>,
    pub retry_attempt: u32,
}

impl ExecutionContext {
    pub fn new(signal: CancellationToken, agent: Option<AgentRef>, retry_attempt: u32) -> Self {
        Self {
            signal,
            agent,
            retry_attempt,
        }
    }

    /// Whether the batch deadline has already passed
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Resolves once the batch deadline passes
    pub async fn cancelled(&self) {
        self.signal.cancelled().await
    }

    /// Downcast the agent reference to a concrete type
    pub fn agent_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.agent.as_deref().and_then(|agent| agent.downcast_ref::<T>())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("cancelled", &self.signal.is_cancelled())
            .field("has_agent", &self.agent.is_some())
            .field("retry_attempt", &self.retry_attempt)
            .finish()
    }
}

/// Per-event parameters handed to every matching callback
#[derive(Clone, Default)]
pub struct HookInvocation {
    /// Event-specific payload, opaque to the engine
    pub input: Value,
    /// Correlation identifier (e.g. the tool call id)
    pub correlation_id: Option<String>,
    pub agent: Option<AgentRef>,
    pub retry_attempt: u32,
}

impl HookInvocation {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_agent(mut self, agent: AgentRef) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_retry_attempt(mut self, retry_attempt: u32) -> Self {
        self.retry_attempt = retry_attempt;
        self
    }
}

impl fmt::Debug for HookInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookInvocation")
            .field("input", &self.input)
            .field("correlation_id", &self.correlation_id)
            .field("has_agent", &self.agent.is_some())
            .field("retry_attempt", &self.retry_attempt)
            .finish()
    }
}

/// A unit of hook logic supplied by the runtime.
///
/// Callbacks may fail, panic, or never finish; the engine turns all of these
/// into an empty output for the slot.
#[async_trait]
pub trait HookCallback: Send + Sync {
    /// Identifier used in diagnostics and statistics
    fn id(&self) -> &str {
        "anonymous"
    }

    async fn call(
        &self,
        input: Value,
        correlation_id: Option<String>,
        ctx: Arc<ExecutionContext>,
    ) -> Result<HookOutput, HookError>;
}

/// A boxed callback for storage in groups
pub type BoxedCallback = Arc<dyn HookCallback>;

/// Adapter turning an async closure into a [`HookCallback`]
pub struct FnCallback<F> {
    id: String,
    func: F,
}

#[async_trait]
impl<F, Fut> HookCallback for FnCallback<F>
where
    F: Fn(Value, Option<String>, Arc<ExecutionContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HookOutput, HookError>> + Send + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(
        &self,
        input: Value,
        correlation_id: Option<String>,
        ctx: Arc<ExecutionContext>,
    ) -> Result<HookOutput, HookError> {
        (self.func)(input, correlation_id, ctx).await
    }
}

/// Build a boxed callback from an async closure
pub fn callback_fn<F, Fut>(id: impl Into<String>, func: F) -> BoxedCallback
where
    F: Fn(Value, Option<String>, Arc<ExecutionContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HookOutput, HookError>> + Send + 'static,
{
    Arc::new(FnCallback {
        id: id.into(),
        func,
    })
}

/// An optional pattern, an ordered list of callbacks and an optional timeout
#[derive(Clone)]
pub struct CallbackGroup {
    id: String,
    pattern: Option<String>,
    matcher: EventMatcher,
    callbacks: Vec<BoxedCallback>,
    timeout_ms: Option<u64>,
}

impl CallbackGroup {
    /// Create a group; `None` matches every event name
    pub fn new(pattern: Option<&str>, callbacks: Vec<BoxedCallback>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pattern: pattern.map(str::to_string),
            matcher: EventMatcher::new(pattern),
            callbacks,
            timeout_ms: None,
        }
    }

    /// Create a group that applies to every event name
    pub fn any(callbacks: Vec<BoxedCallback>) -> Self {
        Self::new(None, callbacks)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn callbacks(&self) -> &[BoxedCallback] {
        &self.callbacks
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Whether this group applies to the given event name
    pub fn matches(&self, event_name: &str) -> bool {
        self.matcher.matches(event_name)
    }
}

impl fmt::Debug for CallbackGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let callback_ids: Vec<&str> = self.callbacks.iter().map(|c| c.id()).collect();
        f.debug_struct("CallbackGroup")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("callbacks", &callback_ids)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Configuration override for a registered group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Group ID
    pub id: String,
    /// Whether the group takes part in dispatch
    pub enabled: bool,
    /// Timeout override in milliseconds
    pub timeout_ms: Option<u64>,
}

/// How one callback slot settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Completed,
    TimedOut,
    Failed(String),
}

/// Outcome of one callback slot in an invocation
#[derive(Debug, Clone)]
pub struct SlotReport {
    pub callback_id: String,
    /// The callback's output, or `{}` when it timed out or failed
    pub output: HookOutput,
    pub status: SlotStatus,
    pub elapsed_ms: u64,
}

/// Statistics for a callback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookStats {
    /// Total number of executions
    pub executions: u64,
    /// Number of executions that returned an output in time
    pub successes: u64,
    /// Number of failed executions
    pub failures: u64,
    /// Number of executions cut off by the deadline
    pub timeouts: u64,
    /// Average execution time in milliseconds
    pub avg_execution_ms: f64,
    /// Maximum execution time in milliseconds
    pub max_execution_ms: u64,
    pub last_executed_at: Option<DateTime<Utc>>,
}

impl HookStats {
    pub fn record_execution(&mut self, duration_ms: u64, status: &SlotStatus) {
        self.executions += 1;

        let total = self.avg_execution_ms * (self.executions - 1) as f64;
        self.avg_execution_ms = (total + duration_ms as f64) / self.executions as f64;

        if duration_ms > self.max_execution_ms {
            self.max_execution_ms = duration_ms;
        }
        self.last_executed_at = Some(Utc::now());

        match status {
            SlotStatus::Completed => self.successes += 1,
            SlotStatus::TimedOut => self.timeouts += 1,
            SlotStatus::Failed(_) => self.failures += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_record_execution() {
        let mut stats = HookStats::default();
        stats.record_execution(10, &SlotStatus::Completed);
        stats.record_execution(30, &SlotStatus::TimedOut);
        stats.record_execution(20, &SlotStatus::Failed("boom".into()));

        assert_eq!(stats.executions, 3);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.max_execution_ms, 30);
        assert!((stats.avg_execution_ms - 20.0).abs() < f64::EPSILON);
        assert!(stats.last_executed_at.is_some());
    }

    #[test]
    fn test_agent_downcast() {
        struct Session {
            name: &'static str,
        }

        let agent: AgentRef = Arc::new(Session { name: "main" });
        let ctx = ExecutionContext::new(CancellationToken::new(), Some(agent), 2);
        assert_eq!(ctx.agent_as::<Session>().map(|s| s.name), Some("main"));
        assert!(ctx.agent_as::<String>().is_none());
        assert_eq!(ctx.retry_attempt, 2);
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_group_builder() {
        let group = CallbackGroup::new(Some("Write|Edit"), Vec::new())
            .with_id("writes")
            .with_timeout_ms(250);

        assert_eq!(group.id(), "writes");
        assert_eq!(group.pattern(), Some("Write|Edit"));
        assert_eq!(group.timeout(), Some(Duration::from_millis(250)));
        assert!(group.matches("Edit"));
        assert!(!group.matches("Read"));
    }

    #[test]
    fn test_invocation_builder() {
        let invocation = HookInvocation::new(json!({"tool": "Write"}))
            .with_correlation_id("toolu_1")
            .with_retry_attempt(1);

        assert_eq!(invocation.correlation_id.as_deref(), Some("toolu_1"));
        assert_eq!(invocation.retry_attempt, 1);
        assert!(invocation.agent.is_none());
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(HookError::from("disk full").to_string(), "Hook failed: disk full");
        assert_eq!(
            HookError::Panicked("index out of bounds".into()).to_string(),
            "Hook panicked: index out of bounds"
        );
    }
}
