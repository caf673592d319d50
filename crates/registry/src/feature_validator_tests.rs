// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dcc_core::{BlueprintId, LifecyclePlans};
use indexmap::IndexMap;

fn blueprint_with(feature: Feature) -> DeviceBlueprint {
    let mut features = IndexMap::new();
    features.insert("fsm".to_string(), feature);
    DeviceBlueprint {
        id: BlueprintId::new("dcc.thing"),
        version: "1.0.0".into(),
        schema_version: 1,
        inherits_from: None,
        features,
        properties: IndexMap::new(),
        actions: IndexMap::new(),
        streams: IndexMap::new(),
        alarms: IndexMap::new(),
        children: IndexMap::new(),
        peer_connections: IndexMap::new(),
        lifecycle_plans: LifecyclePlans::default(),
    }
}

#[test]
fn valid_initial_state_passes() {
    let registry = builtin_feature_validators().unwrap();
    let blueprint = blueprint_with(Feature::OperationalFsm { states: vec!["idle".into(), "busy".into()], initial: "idle".into() });
    assert!(validate_all(&registry, &blueprint).is_ok());
}

#[test]
fn unknown_initial_state_fails() {
    let registry = builtin_feature_validators().unwrap();
    let blueprint = blueprint_with(Feature::OperationalFsm { states: vec!["idle".into()], initial: "busy".into() });
    let err = validate_all(&registry, &blueprint).unwrap_err();
    assert_eq!(err.tag, "operationalFsm");
}

#[test]
fn features_without_a_registered_validator_pass() {
    let registry = builtin_feature_validators().unwrap();
    let blueprint = blueprint_with(Feature::BinaryData);
    assert!(validate_all(&registry, &blueprint).is_ok());
}
