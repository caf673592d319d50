// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sequence_locks_union_children_in_order() {
    let plan = ActionSpec::Sequence {
        steps: vec![
            PlanNode::leaf(ActionSpec::Start { device: "a".into() }),
            PlanNode::leaf(ActionSpec::WriteProperty {
                device: "b".into(),
                property: "p".into(),
                value: serde_json::json!(1),
            }),
        ],
    };
    let locks = plan.direct_locks();
    assert_eq!(locks.len(), 2);
    assert_eq!(locks[0].resource_id, "a");
    assert_eq!(locks[1].resource_id, "b");
    assert_eq!(locks[1].mode, LockMode::ExclusiveWrite);
}

#[test]
fn parallel_branches_report_is_branch() {
    let plan = ActionSpec::Parallel {
        branches: vec![],
        failure_strategy: FailureStrategy::FailFast,
        compensation_order: CompensationOrder::SequentialReverse,
    };
    assert!(plan.is_branch());
    assert!(!ActionSpec::Attach {
        device: "x".into(),
        blueprint_id: "bp".into(),
        blueprint_version: None,
        config: serde_json::Value::Null
    }
    .is_branch());
}

#[test]
fn compensation_policy_field_defaults_to_abort() {
    assert_eq!(CompensationPolicyField::default().0, CompensationPolicy::Abort);
}

#[test]
fn plan_node_leaf_has_no_compensation_by_default() {
    let node = PlanNode::leaf(ActionSpec::Detach { device: "sensor-1".into() });
    assert!(node.compensation.is_none());
    assert!(node.idempotency_key.is_none());
    assert_eq!(node.compensation_policy, CompensationPolicyField::default());
}

#[test]
fn transaction_plan_round_trips_through_json() {
    let plan = TransactionPlan {
        name: "provision".into(),
        root: PlanNode::leaf(ActionSpec::Attach {
            device: "sensor-1".into(),
            blueprint_id: "com.example.sensor".into(),
            blueprint_version: Some("1.0.0".into()),
            config: serde_json::json!({}),
        })
        .with_compensation_policy(CompensationPolicy::Retry)
        .with_idempotency_key("attach-sensor-1"),
        deadline: Some(Duration::from_millis(5_000)),
    };
    let json = serde_json::to_string(&plan).unwrap();
    let back: TransactionPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(plan, back);
}

#[test]
fn sequence_compensation_wraps_a_full_plan() {
    let undo = TransactionPlan::new("undo-attach", PlanNode::leaf(ActionSpec::Detach { device: "a".into() }));
    let node = PlanNode::leaf(ActionSpec::Attach {
        device: "a".into(),
        blueprint_id: "bp".into(),
        blueprint_version: None,
        config: serde_json::Value::Null,
    })
    .with_compensation(undo.clone());
    assert_eq!(node.compensation.as_deref(), Some(&undo));
}

#[test]
fn resource_locks_sort_by_id_then_mode() {
    let mut locks = vec![
        ResourceLockSpec { resource_id: "b".into(), mode: LockMode::SharedRead },
        ResourceLockSpec { resource_id: "a".into(), mode: LockMode::ExclusiveWrite },
    ];
    locks.sort();
    assert_eq!(locks[0].resource_id, "a");
    assert_eq!(locks[1].resource_id, "b");
}
