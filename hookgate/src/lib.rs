//! Concurrent hook invocation and decision aggregation.
//!
//! See [`hooks`] for the engine, registry and reducers, and [`config`] for
//! environment-driven settings.

pub mod config;
pub mod hooks;

pub use config::{ConfigError, HookEngineConfig};
pub use hookgate_types::{HookOutput, PermissionDecision, RetryDirective};
