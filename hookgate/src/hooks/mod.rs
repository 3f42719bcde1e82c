//! Hook system for concurrent, fail-open lifecycle hooks
//!
//! This module runs registered callbacks at lifecycle points and reduces their
//! outputs into decisions the runtime can act on. Hooks can:
//!
//! - Allow, deny or ask about a pending operation
//! - Short-circuit an operation with a cached result
//! - Rewrite an operation's input or result
//! - Recommend a retry with a delay
//!
//! A slow, failing or panicking hook never blocks or aborts the others; it
//! contributes an empty output and a diagnostic.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookgate::hooks::{callback_fn, CallbackGroup, HookEvent, HookInvocation, HookRegistry};
//! use hookgate_types::HookOutput;
//!
//! let registry = HookRegistry::new();
//! registry.register(
//!     HookEvent::BeforeToolCall,
//!     CallbackGroup::new(Some("Write|Edit"), vec![callback_fn("guard", |_input, _id, _ctx| async move {
//!         Ok(HookOutput::deny())
//!     })]),
//! );
//!
//! let invocation = HookInvocation::new(serde_json::json!({"file_path": "a.txt"}));
//! let resolution = registry
//!     .dispatch_resolved(HookEvent::BeforeToolCall, "Write", &invocation)
//!     .await;
//! if resolution.is_denied() {
//!     // Refuse the tool call
//! }
//! ```

mod decision;
mod diagnostics;
mod engine;
mod manager;
mod matcher;
mod types;

#[cfg(test)]
mod dispatcher_tests;

pub use decision::{
    HookResolution, aggregate_decision, extract_respond_with, extract_retry_decision,
    extract_updated_input, extract_updated_result,
};
pub use diagnostics::{Diagnostic, HookDiagnostics, LogDiagnostics, MemoryDiagnostics};
pub use engine::{DEFAULT_TIMEOUT_MS, HookEngine};
pub use manager::HookRegistry;
pub use matcher::{EventMatcher, matches};
pub use types::{
    AgentRef, BoxedCallback, CallbackGroup, ExecutionContext, FnCallback, HookCallback, HookConfig,
    HookError, HookEvent, HookInvocation, HookStats, SlotReport, SlotStatus, callback_fn,
};
