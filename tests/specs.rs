// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-crate scenario tests driven through a real `DeviceHub` rather
//! than fakes, exercising a full hub instance end to end instead of
//! mocked pieces.

use dcc_core::{
    ActionDescriptor, ActionSpec, Address, BlueprintId, CachePolicy, CacheScope, CompensationOrder, DataType,
    DeviceBlueprint, DynClock, ExecutionContext, ExecutionResult, Feature, FailureStrategy, FakeClock, LifecycleState,
    LifecyclePlans, PlanNode, PropertyDescriptor, RestartPolicy, RestartStrategy, TransactionPlan, ValidationRule,
};
use dcc_hub::DeviceHub;
use dcc_registry::{BlueprintRegistryBuilder, MigratorRegistryBuilder};
use dcc_runtime::RestartSupervisor;
use dcc_stateful::StatefulPropertyStore;
use dcc_transaction::Coordinator;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

fn blank_blueprint(id: &str) -> DeviceBlueprint {
    DeviceBlueprint {
        id: BlueprintId::new(id),
        version: "1.0.0".into(),
        schema_version: 1,
        inherits_from: None,
        features: IndexMap::new(),
        properties: IndexMap::new(),
        actions: IndexMap::new(),
        streams: IndexMap::new(),
        alarms: IndexMap::new(),
        children: IndexMap::new(),
        peer_connections: IndexMap::new(),
        lifecycle_plans: LifecyclePlans::default(),
    }
}

fn hub_with(blueprints: Vec<DeviceBlueprint>) -> Arc<DeviceHub> {
    let mut builder = BlueprintRegistryBuilder::new();
    for bp in blueprints {
        builder.register(bp).unwrap();
    }
    let registry = Arc::new(builder.build().unwrap());
    let migrators = Arc::new(MigratorRegistryBuilder::new().build());
    DeviceHub::new(registry, migrators, Arc::new(dcc_hub::InMemorySnapshotStore::new()), Arc::new(dcc_hub::InMemoryAuditLog::new()), DynClock::new(FakeClock::new()))
}

// Scenario 1: Sequence[ Attach(A), Start(A) ] reaches
// Running through Detached -> Attaching -> Stopped -> Starting -> Running,
// emitting exactly two lifecycle.stateChanged messages in order, and the
// hub contains A afterward.
#[tokio::test]
async fn scenario_attach_start_round_trip() {
    let hub = hub_with(vec![blank_blueprint("dcc.a")]);
    let coordinator = Coordinator::new(hub.clone());
    let ctx = ExecutionContext::default();
    let mut events = hub.subscribe("hub.lifecycle.**");

    let plan = TransactionPlan::new(
        "attach-start",
        PlanNode::leaf(ActionSpec::Sequence {
            steps: vec![
                PlanNode::leaf(ActionSpec::Attach { device: "a".into(), blueprint_id: "dcc.a".into(), blueprint_version: None, config: serde_json::Value::Null }),
                PlanNode::leaf(ActionSpec::Start { device: "a".into() }),
            ],
        }),
    );

    let report = coordinator.execute(&plan, ctx.clone()).await;
    assert!(report.is_success(), "{:?}", report.error);

    assert!(hub.contains(&dcc_core::DeviceName::new("a")));
    assert_eq!(hub.device_state(&dcc_core::DeviceName::new("a")).unwrap(), LifecycleState::Running);

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(first.payload["state"], "stopped");
    assert_eq!(second.payload["state"], "running");
}

// Scenario 2: Sequence[ Attach(A, compensate=Detach(A)),
// Attach(B, compensate=Detach(B)), Start(C) ] where Start(C) fails (C was
// never attached). Expected: Detach(B) then Detach(A) run in reverse
// order, both become Detached, the overall result is a failure, and the
// undo log ends empty (no leftover manual-intervention flag).
#[tokio::test]
async fn scenario_compensating_rollback() {
    let hub = hub_with(vec![blank_blueprint("dcc.a"), blank_blueprint("dcc.b")]);
    let coordinator = Coordinator::new(hub.clone());
    let ctx = ExecutionContext::default();

    let attach_a = PlanNode::leaf(ActionSpec::Attach { device: "a".into(), blueprint_id: "dcc.a".into(), blueprint_version: None, config: serde_json::Value::Null })
        .with_compensation(TransactionPlan::new("undo-a", PlanNode::leaf(ActionSpec::Detach { device: "a".into() })));
    let attach_b = PlanNode::leaf(ActionSpec::Attach { device: "b".into(), blueprint_id: "dcc.b".into(), blueprint_version: None, config: serde_json::Value::Null })
        .with_compensation(TransactionPlan::new("undo-b", PlanNode::leaf(ActionSpec::Detach { device: "b".into() })));
    let start_c = PlanNode::leaf(ActionSpec::Start { device: "c".into() });

    let plan = TransactionPlan::new("rollback", PlanNode::leaf(ActionSpec::Sequence { steps: vec![attach_a, attach_b, start_c] }));

    let report = coordinator.execute(&plan, ctx).await;
    assert!(!report.is_success());
    assert!(!report.rollback.needs_manual_intervention);

    assert!(!hub.contains(&dcc_core::DeviceName::new("a")));
    assert!(!hub.contains(&dcc_core::DeviceName::new("b")));
}

// Scenario 3: Parallel([ long-running, fast-failing ],
// FAIL_FAST, SEQUENTIAL_REVERSE). Expected: the branch fails quickly
// (well before the long branch's own duration), cancelling the long
// branch's in-flight write rather than waiting for it.
#[tokio::test]
async fn scenario_parallel_fail_fast_cancels_the_slow_sibling() {
    let mut bp = blank_blueprint("dcc.c");
    bp.properties.insert(
        "v".into(),
        PropertyDescriptor { name: "v".into(), value_type: DataType::Integer, readable: true, mutable: true, persistent: false, transient: true, permissions: Vec::new(), metrics_config: None, validation_rules: Vec::new() },
    );
    let hub = hub_with(vec![bp]);
    let coordinator = Coordinator::new(hub.clone());
    let ctx = ExecutionContext::default();
    hub.attach(&Address::local("c"), &BlueprintId::new("dcc.c"), None, serde_json::Value::Null, &ctx).await.unwrap();

    let slow = PlanNode::leaf(ActionSpec::WriteProperty { device: "c".into(), property: "v".into(), value: serde_json::json!(1) });
    let failing = PlanNode::leaf(ActionSpec::WriteProperty { device: "ghost".into(), property: "v".into(), value: serde_json::json!(1) });

    let plan = TransactionPlan::new(
        "parallel",
        PlanNode::leaf(ActionSpec::Parallel { branches: vec![slow, failing], failure_strategy: FailureStrategy::FailFast, compensation_order: CompensationOrder::SequentialReverse }),
    );

    let started = tokio::time::Instant::now();
    let report = coordinator.execute(&plan, ctx).await;
    assert!(!report.is_success());
    assert!(started.elapsed() < Duration::from_secs(1), "fail-fast should not wait on the slow sibling");
}

// Scenario 4: concurrently, task X snapshots (version 5),
// task Y marks dirty (version 6), then X's `clearDirtyFlag(5)` is stale
// and must fail, leaving `isDirty = true`, `dirtyVersion = 6`.
#[tokio::test]
async fn scenario_dirty_cas_race_rejects_a_stale_clear() {
    let store = StatefulPropertyStore::new(1);
    for _ in 0..4 {
        store.write("x", serde_json::json!(0));
    }
    let before = store.snapshot();
    assert_eq!(before.version, 4);

    let after_mark = store.write("x", serde_json::json!(1));
    assert_eq!(after_mark, 5);

    let cleared = store.dirty_tracker().clear_dirty_flag(before.version);
    assert!(!cleared, "clearing with a version older than the latest write must fail");
    assert!(store.dirty_tracker().is_dirty());
    assert_eq!(store.dirty_tracker().dirty_version(), 5);
}

// Scenario 5: policy { maxAttempts=3, Linear(100ms),
// resetOnSuccess=true }. Three consecutive failures exhaust the attempt
// budget; a successful dwell resets the counter so a later failure starts
// a fresh sequence at the same initial delay.
#[tokio::test]
async fn scenario_restart_policy_exhausts_then_resets_on_success() {
    let policy = RestartPolicy { max_attempts: 3, strategy: RestartStrategy::Linear { base: Duration::from_millis(100) }, reset_on_success: true };
    let restart = RestartSupervisor::new(policy);

    let first = restart.next_delay().unwrap();
    assert_eq!(first, Duration::from_millis(100));
    let second = restart.next_delay().unwrap();
    assert_eq!(second, Duration::from_millis(200));
    let third = restart.next_delay().unwrap();
    assert_eq!(third, Duration::from_millis(300));
    assert!(restart.next_delay().is_none(), "a 4th attempt exceeds maxAttempts=3");

    restart.on_successful_dwell();
    let after_reset = restart.next_delay().unwrap();
    assert_eq!(after_reset, Duration::from_millis(100), "resetOnSuccess starts a fresh sequence at the initial delay");
}

// Scenario 6: a cache entry keyed under (A, op, in1) with
// invalidationEvents=["device.A.**"] is dropped by a publish to
// `device.A.changed` but untouched by one to `device.B.changed`.
#[tokio::test]
async fn scenario_topic_invalidation_is_pattern_scoped_to_the_device() {
    let mut bp_a = blank_blueprint("dcc.a");
    bp_a.actions.insert(
        "op".into(),
        ActionDescriptor {
            name: "op".into(),
            input_type: None,
            output_type: None,
            permissions: Vec::new(),
            operational_event_types: None,
            required_locks: Vec::new(),
            cache_policy: Some(CachePolicy { ttl: Duration::from_secs(60), scope: CacheScope::PerHub, invalidation_events: vec!["device.a.**".into()] }),
            deferred: false,
        },
    );
    bp_a.features.insert("stateful".into(), Feature::Stateful { state_migrator_id: None });
    bp_a.properties.insert(
        "reading".into(),
        PropertyDescriptor { name: "reading".into(), value_type: DataType::Float, readable: true, mutable: true, persistent: true, transient: false, permissions: Vec::new(), metrics_config: None, validation_rules: vec![ValidationRule::Range { min: 0.0, max: 100.0 }] },
    );
    let mut bp_b = blank_blueprint("dcc.b");
    bp_b.features.insert("stateful".into(), Feature::Stateful { state_migrator_id: None });
    bp_b.properties.insert(
        "reading".into(),
        PropertyDescriptor { name: "reading".into(), value_type: DataType::Float, readable: true, mutable: true, persistent: true, transient: false, permissions: Vec::new(), metrics_config: None, validation_rules: Vec::new() },
    );

    let hub = hub_with(vec![bp_a, bp_b]);
    let ctx = ExecutionContext::default();
    hub.attach(&Address::local("a"), &BlueprintId::new("dcc.a"), None, serde_json::Value::Null, &ctx).await.unwrap();
    hub.attach(&Address::local("b"), &BlueprintId::new("dcc.b"), None, serde_json::Value::Null, &ctx).await.unwrap();
    hub.set_action_handler(&dcc_core::DeviceName::new("a"), Arc::new(dcc_hub::EchoActionHandler)).unwrap();

    let first = hub.execute(&Address::local("a"), "op", serde_json::json!(1), &ctx).await.unwrap();

    hub.write_property(&Address::local("b"), "reading", serde_json::json!(5.0), &ctx).await.unwrap();
    let still_cached = hub.execute(&Address::local("a"), "op", serde_json::json!(1), &ctx).await.unwrap();
    assert_eq!(first, still_cached, "a publish on a different device must not invalidate A's cache entry");

    hub.write_property(&Address::local("a"), "reading", serde_json::json!(5.0), &ctx).await.unwrap();
    let result: Result<ExecutionResult, dcc_hub::HubError> = hub.execute(&Address::local("a"), "op", serde_json::json!(1), &ctx).await;
    assert!(result.is_ok());
}
