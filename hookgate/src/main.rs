use dotenv::dotenv;
use hookgate::hooks::{
    CallbackGroup, HookError, HookEvent, HookInvocation, HookRegistry, HookResolution, callback_fn,
};
use hookgate::{HookEngineConfig, HookOutput, PermissionDecision};
use serde_json::json;

/// Sample hooks wired the way a runtime would register them
fn register_demo_hooks(registry: &HookRegistry) {
    // Only allow writes inside the workspace; redirect everything else to a sandbox
    registry.register(
        HookEvent::BeforeToolCall,
        CallbackGroup::new(
            Some("Write|Edit"),
            vec![callback_fn("workspace_guard", |input, _id, _ctx| async move {
                let path = input
                    .get("file_path")
                    .and_then(|p| p.as_str())
                    .unwrap_or_default();
                if path.starts_with('/') {
                    Ok(HookOutput::allow().with_updated_input(json!({
                        "file_path": format!("/tmp/sandbox{}", path)
                    })))
                } else {
                    Ok(HookOutput::allow())
                }
            })],
        )
        .with_id("workspace_guard"),
    );

    // A broken hook and a hung hook; neither should affect the outcome
    registry.register(
        HookEvent::BeforeToolCall,
        CallbackGroup::any(vec![
            callback_fn("audit_sink", |_input, _id, _ctx| async move {
                Err(HookError::failed("audit sink unreachable"))
            }),
            callback_fn("slow_policy", |_input, _id, ctx| async move {
                ctx.cancelled().await;
                Ok(HookOutput::deny())
            }),
        ])
        .with_id("observers")
        .with_timeout_ms(100),
    );
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = HookEngineConfig::from_env();
    log::info!(
        "Initializing hook registry (default timeout {}ms, default decision {})",
        config.default_timeout_ms,
        config.default_decision
    );

    let registry = HookRegistry::from_config(&config);
    register_demo_hooks(&registry);
    log::info!("Registered {} hook groups", registry.group_count());

    let invocation = HookInvocation::new(json!({
        "tool_name": "Write",
        "file_path": "/etc/hosts",
        "content": "127.0.0.1 localhost"
    }))
    .with_correlation_id("toolu_demo");

    let outputs = registry
        .dispatch(HookEvent::BeforeToolCall, "Write", &invocation)
        .await;
    let resolution = HookResolution::from_outputs(&outputs, config.default_decision);

    match serde_json::to_string_pretty(&json!({
        "outputs": outputs,
        "resolution": resolution,
    })) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => log::error!("Failed to render dispatch result: {}", e),
    }

    match resolution.decision {
        PermissionDecision::Allow => log::info!("Tool call may proceed"),
        PermissionDecision::Ask => log::info!("Tool call needs confirmation"),
        PermissionDecision::Deny => log::info!("Tool call refused"),
    }
}
