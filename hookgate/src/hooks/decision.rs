//! Reducing collected hook outputs into decisions
//!
//! All functions here are pure over the output list. The aggregator only looks
//! at which decisions are present; the extractors pick the first output (in
//! dispatch order) that carries the field and ignore the rest.

use hookgate_types::{HookOutput, PermissionDecision, RetryDirective};
use serde::Serialize;
use serde_json::Value;

/// Combine permission decisions with precedence `deny > ask > allow > default`
pub fn aggregate_decision(outputs: &[HookOutput], default: PermissionDecision) -> PermissionDecision {
    outputs
        .iter()
        .filter_map(|output| output.permission_decision)
        .max_by_key(|decision| decision.severity())
        .unwrap_or(default)
}

/// First cached/mocked result, used to short-circuit the operation
pub fn extract_respond_with(outputs: &[HookOutput]) -> Option<&Value> {
    outputs.iter().find_map(|output| output.respond_with.as_ref())
}

/// First rewritten input
pub fn extract_updated_input(outputs: &[HookOutput]) -> Option<&Value> {
    outputs.iter().find_map(|output| output.updated_input.as_ref())
}

/// First rewritten result
pub fn extract_updated_result(outputs: &[HookOutput]) -> Option<&Value> {
    outputs.iter().find_map(|output| output.updated_result.as_ref())
}

/// First retry request; a missing delay means retry immediately.
/// Later outputs, including ones that explicitly decline a retry, are not consulted.
pub fn extract_retry_decision(outputs: &[HookOutput]) -> Option<RetryDirective> {
    outputs
        .iter()
        .find(|output| output.requests_retry())
        .map(|output| RetryDirective::after_ms(output.retry_delay_ms.unwrap_or(0)))
}

/// Everything the runtime needs to decide its next step, in one value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResolution {
    pub decision: PermissionDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respond_with: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryDirective>,
}

impl HookResolution {
    pub fn from_outputs(outputs: &[HookOutput], default: PermissionDecision) -> Self {
        Self {
            decision: aggregate_decision(outputs, default),
            respond_with: extract_respond_with(outputs).cloned(),
            updated_input: extract_updated_input(outputs).cloned(),
            updated_result: extract_updated_result(outputs).cloned(),
            retry: extract_retry_decision(outputs),
        }
    }

    /// The operation may run without asking anyone
    pub fn should_proceed(&self) -> bool {
        self.decision == PermissionDecision::Allow
    }

    pub fn is_denied(&self) -> bool {
        self.decision == PermissionDecision::Deny
    }

    pub fn needs_confirmation(&self) -> bool {
        self.decision == PermissionDecision::Ask
    }

    /// Cached result to use instead of running the operation
    pub fn short_circuit(&self) -> Option<&Value> {
        self.respond_with.as_ref()
    }
}
