//! Shared wire types for hook outputs.
//!
//! These are kept free of any async runtime so that runtimes and
//! out-of-process hook implementations can agree on the output vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =====================================================
// Permission decisions
// =====================================================

/// Verdict a hook may give about the pending operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    #[default]
    Allow,
    Deny,
    Ask,
}

impl PermissionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionDecision::Allow => "allow",
            PermissionDecision::Deny => "deny",
            PermissionDecision::Ask => "ask",
        }
    }

    /// Position in the `deny > ask > allow` lattice (higher wins)
    pub fn severity(&self) -> u8 {
        match self {
            PermissionDecision::Allow => 1,
            PermissionDecision::Ask => 2,
            PermissionDecision::Deny => 3,
        }
    }

    /// Parse the lowercase wire form
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(PermissionDecision::Allow),
            "deny" => Some(PermissionDecision::Deny),
            "ask" => Some(PermissionDecision::Ask),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =====================================================
// Hook output
// =====================================================

/// Output of a single hook callback.
///
/// Every field is optional; an absent field means the hook has no opinion on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,
    /// Cached or mocked value that replaces the operation entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respond_with: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

impl HookOutput {
    /// The neutral `{}` output
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn allow() -> Self {
        Self::decision(PermissionDecision::Allow)
    }

    pub fn deny() -> Self {
        Self::decision(PermissionDecision::Deny)
    }

    pub fn ask() -> Self {
        Self::decision(PermissionDecision::Ask)
    }

    pub fn decision(decision: PermissionDecision) -> Self {
        Self {
            permission_decision: Some(decision),
            ..Self::default()
        }
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    pub fn with_respond_with(mut self, value: Value) -> Self {
        self.respond_with = Some(value);
        self
    }

    pub fn with_updated_input(mut self, value: Value) -> Self {
        self.updated_input = Some(value);
        self
    }

    pub fn with_updated_result(mut self, value: Value) -> Self {
        self.updated_result = Some(value);
        self
    }

    /// Request a retry; `None` leaves the delay unspecified
    pub fn with_retry(mut self, delay_ms: Option<u64>) -> Self {
        self.retry = Some(true);
        self.retry_delay_ms = delay_ms;
        self
    }

    /// True when the output carries no opinion on anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn requests_retry(&self) -> bool {
        self.retry == Some(true)
    }
}

// =====================================================
// Retry directive
// =====================================================

/// Retry recommendation extracted from hook outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryDirective {
    pub retry: bool,
    pub retry_delay_ms: u64,
}

impl RetryDirective {
    pub fn after_ms(retry_delay_ms: u64) -> Self {
        Self {
            retry: true,
            retry_delay_ms,
        }
    }
}
