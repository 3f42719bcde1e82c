//! End-to-end tests for dispatching events across callback groups.
//!
//! These tests verify that output order is fixed by group registration order
//! and then callback order, whatever the completion timing, and that failing
//! or hanging hooks only cost their group's timeout.

use super::decision::{aggregate_decision, extract_respond_with, extract_retry_decision};
use super::diagnostics::MemoryDiagnostics;
use super::engine::HookEngine;
use super::types::{BoxedCallback, CallbackGroup, HookError, HookInvocation, callback_fn};
use hookgate_types::{HookOutput, PermissionDecision, RetryDirective};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn after(id: &str, delay_ms: u64, output: HookOutput) -> BoxedCallback {
    callback_fn(id, move |_input, _id, _ctx| {
        let output = output.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(output)
        }
    })
}

#[tokio::test]
async fn test_mixed_groups_end_to_end() {
    let h1 = after("h1", 10, HookOutput::allow());
    let h2 = callback_fn("h2", |_input, _id, _ctx| async move {
        Err(HookError::failed("thrown before doing any work"))
    });
    let h3 = callback_fn("h3", |_input, _id, _ctx| async move {
        std::future::pending::<()>().await;
        Ok(HookOutput::deny())
    });

    let groups = vec![
        CallbackGroup::new(Some("Write|Edit"), vec![h1]),
        CallbackGroup::any(vec![h2, h3]).with_timeout_ms(100),
    ];

    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let engine = HookEngine::new().with_diagnostics(diagnostics.clone());

    let start = Instant::now();
    let outputs = engine
        .dispatch(&groups, "Write", &HookInvocation::new(json!({"file_path": "notes.md"})))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(
        outputs,
        vec![HookOutput::allow(), HookOutput::empty(), HookOutput::empty()]
    );
    assert_eq!(
        aggregate_decision(&outputs, PermissionDecision::Allow),
        PermissionDecision::Allow
    );

    // Bounded by h3's timeout, not by the sum of delays
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(600));

    assert_eq!(diagnostics.failures(), 1);
    assert_eq!(diagnostics.timeouts(), 1);
}

#[tokio::test]
async fn test_non_matching_groups_contribute_nothing() {
    let groups = vec![
        CallbackGroup::new(Some("^Bash$"), vec![after("bash", 0, HookOutput::deny())]),
        CallbackGroup::new(Some("Read"), vec![after("read", 0, HookOutput::ask())]),
    ];

    let outputs = HookEngine::new()
        .dispatch(&groups, "Write", &HookInvocation::default())
        .await;
    assert!(outputs.is_empty());
    assert_eq!(
        aggregate_decision(&outputs, PermissionDecision::Ask),
        PermissionDecision::Ask
    );
}

#[tokio::test]
async fn test_malformed_pattern_matches_literally() {
    let groups = vec![CallbackGroup::new(
        Some("["),
        vec![after("bracket", 0, HookOutput::deny())],
    )];
    let engine = HookEngine::new();

    let outputs = engine.dispatch(&groups, "Write", &HookInvocation::default()).await;
    assert!(outputs.is_empty());

    let outputs = engine.dispatch(&groups, "[", &HookInvocation::default()).await;
    assert_eq!(outputs, vec![HookOutput::deny()]);
}

#[tokio::test]
async fn test_group_order_beats_completion_order() {
    // The first group finishes last, yet its opinions come first
    let groups = vec![
        CallbackGroup::any(vec![
            after("slow_cache", 80, HookOutput::empty().with_respond_with(json!("cached-A"))),
            after("slow_retry", 60, HookOutput::empty().with_retry(None)),
        ]),
        CallbackGroup::any(vec![
            after("fast_cache", 0, HookOutput::empty().with_respond_with(json!("cached-B"))),
            after("fast_retry", 0, HookOutput::empty().with_retry(Some(1000))),
        ]),
    ];

    let outputs = HookEngine::new()
        .dispatch(&groups, "WebFetch", &HookInvocation::default())
        .await;

    assert_eq!(outputs.len(), 4);
    assert_eq!(extract_respond_with(&outputs), Some(&json!("cached-A")));
    assert_eq!(extract_retry_decision(&outputs), Some(RetryDirective::after_ms(0)));
}

#[tokio::test]
async fn test_deny_anywhere_wins_across_groups() {
    let groups = vec![
        CallbackGroup::any(vec![
            after("a", 5, HookOutput::allow()),
            after("b", 0, HookOutput::allow()),
        ]),
        CallbackGroup::new(Some("Edit"), vec![after("c", 15, HookOutput::deny())]),
        CallbackGroup::any(vec![after("d", 0, HookOutput::ask())]),
    ];

    let outputs = HookEngine::new()
        .dispatch(&groups, "Edit", &HookInvocation::default())
        .await;

    assert_eq!(outputs.len(), 4);
    assert_eq!(
        aggregate_decision(&outputs, PermissionDecision::Allow),
        PermissionDecision::Deny
    );
}

#[tokio::test]
async fn test_default_timeout_used_when_group_has_none() {
    let groups = vec![CallbackGroup::any(vec![callback_fn(
        "hangs",
        |_input, _id, _ctx| async move {
            std::future::pending::<()>().await;
            Ok(HookOutput::allow())
        },
    )])];

    let engine = HookEngine::new().with_default_timeout(Duration::from_millis(40));
    let start = Instant::now();
    let outputs = engine.dispatch(&groups, "Stop", &HookInvocation::default()).await;

    assert_eq!(outputs, vec![HookOutput::empty()]);
    assert!(start.elapsed() < Duration::from_millis(500));
}
