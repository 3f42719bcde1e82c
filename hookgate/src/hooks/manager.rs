//! HookRegistry - Owns callback groups per lifecycle event and dispatches them
//!
//! The HookRegistry is responsible for:
//! - Registering and unregistering callback groups, preserving registration order
//! - Applying per-group configuration overrides (enabled, timeout)
//! - Dispatching an event through the engine
//! - Tracking per-callback statistics

use dashmap::DashMap;
use hookgate_types::{HookOutput, PermissionDecision};
use std::collections::HashMap;

use super::decision::HookResolution;
use super::engine::HookEngine;
use super::types::{CallbackGroup, HookConfig, HookEvent, HookInvocation, HookStats};
use crate::config::HookEngineConfig;

/// Registry of callback groups keyed by lifecycle event
pub struct HookRegistry {
    engine: HookEngine,
    /// Groups per event, in registration order
    groups_by_event: DashMap<HookEvent, Vec<CallbackGroup>>,
    /// Group configuration overrides
    configs: DashMap<String, HookConfig>,
    /// Callback statistics, keyed by callback id
    stats: DashMap<String, HookStats>,
    /// Decision used when no hook expresses one
    default_decision: PermissionDecision,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::with_engine(HookEngine::new())
    }

    pub fn with_engine(engine: HookEngine) -> Self {
        Self {
            engine,
            groups_by_event: DashMap::new(),
            configs: DashMap::new(),
            stats: DashMap::new(),
            default_decision: PermissionDecision::Allow,
        }
    }

    pub fn from_config(config: &HookEngineConfig) -> Self {
        let mut registry = Self::with_engine(HookEngine::from_config(config));
        registry.default_decision = config.default_decision;
        registry
    }

    pub fn engine(&self) -> &HookEngine {
        &self.engine
    }

    pub fn default_decision(&self) -> PermissionDecision {
        self.default_decision
    }

    /// Register a group for an event. Returns the group id.
    pub fn register(&self, event: HookEvent, group: CallbackGroup) -> String {
        let id = group.id().to_string();

        log::debug!(
            "[HOOKS] Registered group {} for {} (pattern: {:?}, {} callbacks)",
            id,
            event,
            group.pattern(),
            group.callbacks().len()
        );

        self.groups_by_event.entry(event).or_default().push(group);
        id
    }

    /// Unregister a group from every event. Returns whether anything was removed.
    pub fn unregister(&self, group_id: &str) -> bool {
        let mut removed = false;
        for mut entry in self.groups_by_event.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|group| group.id() != group_id);
            removed |= entry.value().len() != before;
        }
        if removed {
            self.configs.remove(group_id);
            log::debug!("[HOOKS] Unregistered group: {}", group_id);
        }
        removed
    }

    /// Set group configuration
    pub fn configure(&self, config: HookConfig) {
        let id = config.id.clone();
        self.configs.insert(id, config);
    }

    fn is_enabled(&self, group: &CallbackGroup) -> bool {
        self.configs
            .get(group.id())
            .map(|config| config.enabled)
            .unwrap_or(true)
    }

    /// Apply the timeout override, if any
    fn effective_group(&self, group: &CallbackGroup) -> CallbackGroup {
        match self.configs.get(group.id()).and_then(|config| config.timeout_ms) {
            Some(timeout_ms) => group.clone().with_timeout_ms(timeout_ms),
            None => group.clone(),
        }
    }

    /// Registered groups for an event, in registration order
    pub fn groups_for(&self, event: HookEvent) -> Vec<CallbackGroup> {
        self.groups_by_event
            .get(&event)
            .map(|groups| groups.clone())
            .unwrap_or_default()
    }

    /// Total number of registered groups across all events
    pub fn group_count(&self) -> usize {
        self.groups_by_event.iter().map(|entry| entry.value().len()).sum()
    }

    /// Dispatch `event`, matching group patterns against `match_target`
    /// (typically the tool name), and return the ordered outputs.
    pub async fn dispatch(
        &self,
        event: HookEvent,
        match_target: &str,
        invocation: &HookInvocation,
    ) -> Vec<HookOutput> {
        // Snapshot so no map guard is held across the await
        let groups: Vec<CallbackGroup> = self
            .groups_for(event)
            .iter()
            .filter(|group| self.is_enabled(group))
            .map(|group| self.effective_group(group))
            .collect();

        if groups.is_empty() {
            return Vec::new();
        }

        log::debug!(
            "[HOOKS] Dispatching {} for '{}' across {} groups",
            event,
            match_target,
            groups.len()
        );

        let reports = self
            .engine
            .dispatch_detailed(&groups, match_target, invocation)
            .await;

        for report in &reports {
            self.stats
                .entry(report.callback_id.clone())
                .or_default()
                .record_execution(report.elapsed_ms, &report.status);
        }

        reports.into_iter().map(|report| report.output).collect()
    }

    /// Dispatch and reduce the outputs with the registry's default decision
    pub async fn dispatch_resolved(
        &self,
        event: HookEvent,
        match_target: &str,
        invocation: &HookInvocation,
    ) -> HookResolution {
        let outputs = self.dispatch(event, match_target, invocation).await;
        HookResolution::from_outputs(&outputs, self.default_decision)
    }

    /// Get statistics for a callback
    pub fn get_stats(&self, callback_id: &str) -> Option<HookStats> {
        self.stats.get(callback_id).map(|s| s.clone())
    }

    /// Get all statistics
    pub fn get_all_stats(&self) -> HashMap<String, HookStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::types::callback_fn;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn deny_writes() -> CallbackGroup {
        CallbackGroup::new(
            Some("Write|Edit"),
            vec![callback_fn("deny_writes", |_input, _id, _ctx| async move {
                Ok(HookOutput::deny())
            })],
        )
        .with_id("deny_writes")
    }

    #[tokio::test]
    async fn test_group_registration() {
        let registry = HookRegistry::new();

        let id = registry.register(HookEvent::BeforeToolCall, deny_writes());
        assert_eq!(id, "deny_writes");
        assert_eq!(registry.group_count(), 1);
        assert_eq!(registry.groups_for(HookEvent::BeforeToolCall).len(), 1);
        assert!(registry.groups_for(HookEvent::AfterToolCall).is_empty());

        assert!(registry.unregister("deny_writes"));
        assert!(!registry.unregister("deny_writes"));
        assert_eq!(registry.group_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_resolves_decision() {
        let registry = HookRegistry::new();
        registry.register(HookEvent::BeforeToolCall, deny_writes());

        let invocation = HookInvocation::new(json!({"file_path": "a.txt"}));
        let resolution = registry
            .dispatch_resolved(HookEvent::BeforeToolCall, "Write", &invocation)
            .await;
        assert!(resolution.is_denied());

        let resolution = registry
            .dispatch_resolved(HookEvent::BeforeToolCall, "Read", &invocation)
            .await;
        assert!(resolution.should_proceed());

        // Other events are untouched
        let outputs = registry
            .dispatch(HookEvent::AfterToolCall, "Write", &invocation)
            .await;
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_group_is_skipped() {
        let registry = HookRegistry::new();
        registry.register(HookEvent::BeforeToolCall, deny_writes());
        registry.configure(HookConfig {
            id: "deny_writes".to_string(),
            enabled: false,
            timeout_ms: None,
        });

        let outputs = registry
            .dispatch(HookEvent::BeforeToolCall, "Write", &HookInvocation::default())
            .await;
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_override_and_stats() {
        let registry = HookRegistry::new();
        registry.register(
            HookEvent::BeforeGeneration,
            CallbackGroup::any(vec![callback_fn("hangs", |_input, _id, _ctx| async move {
                std::future::pending::<()>().await;
                Ok(HookOutput::allow())
            })])
            .with_id("hanging"),
        );
        registry.configure(HookConfig {
            id: "hanging".to_string(),
            enabled: true,
            timeout_ms: Some(50),
        });

        let start = Instant::now();
        let outputs = registry
            .dispatch(HookEvent::BeforeGeneration, "model", &HookInvocation::default())
            .await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(outputs, vec![HookOutput::empty()]);

        let stats = registry.get_stats("hangs").unwrap();
        assert_eq!(stats.executions, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.successes, 0);
        assert_eq!(registry.get_all_stats().len(), 1);
    }

    #[tokio::test]
    async fn test_default_decision_from_config() {
        let config = HookEngineConfig {
            default_timeout_ms: 1_000,
            default_decision: PermissionDecision::Ask,
        };
        let registry = HookRegistry::from_config(&config);
        assert_eq!(registry.engine().default_timeout(), Duration::from_millis(1_000));

        let resolution = registry
            .dispatch_resolved(HookEvent::BeforeToolCall, "Bash", &HookInvocation::default())
            .await;
        assert!(resolution.needs_confirmation());
    }
}
