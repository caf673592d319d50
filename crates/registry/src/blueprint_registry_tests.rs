// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dcc_core::{DataType, LifecyclePlans, PropertyDescriptor};
use indexmap::IndexMap;

fn property(name: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.into(),
        value_type: DataType::Float,
        readable: true,
        mutable: true,
        persistent: false,
        transient: false,
        permissions: vec![],
        metrics_config: None,
        validation_rules: vec![],
    }
}

fn blueprint(id: &str, inherits_from: Option<&str>) -> DeviceBlueprint {
    DeviceBlueprint {
        id: BlueprintId::new(id),
        version: "1.0.0".into(),
        schema_version: 1,
        inherits_from: inherits_from.map(BlueprintId::new),
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

#[test]
fn duplicate_registration_is_rejected() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.base", None)).unwrap();
    let err = builder.register(blueprint("dcc.base", None)).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateBlueprint(BlueprintId::new("dcc.base")));
}

#[test]
fn distinct_versions_of_the_same_id_both_register() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.base", None)).unwrap();
    let mut v2 = blueprint("dcc.base", None);
    v2.version = "2.0.0".into();
    builder.register(v2).unwrap();
    let registry = builder.build().unwrap();
    assert!(registry.contains_version(&BlueprintId::new("dcc.base"), "1.0.0"));
    assert!(registry.contains_version(&BlueprintId::new("dcc.base"), "2.0.0"));
}

#[test]
fn resolve_with_no_version_picks_the_newest() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.base", None)).unwrap();
    let mut v2 = blueprint("dcc.base", None);
    v2.version = "2.0.0".into();
    v2.schema_version = 2;
    builder.register(v2).unwrap();
    let registry = builder.build().unwrap();

    let resolved = registry.resolve(&BlueprintId::new("dcc.base"), None).unwrap();
    assert_eq!(resolved.version, "2.0.0");
    assert_eq!(resolved.schema_version, 2);

    let pinned = registry.resolve(&BlueprintId::new("dcc.base"), Some("1.0.0")).unwrap();
    assert_eq!(pinned.schema_version, 1);
}

#[test]
fn unknown_parent_is_rejected_at_build() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.child", Some("dcc.missing"))).unwrap();
    assert!(matches!(builder.build(), Err(RegistryError::UnknownParent(..))));
}

#[test]
fn self_referential_inheritance_is_a_cycle() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.loop", Some("dcc.loop"))).unwrap();
    assert!(matches!(builder.build(), Err(RegistryError::InheritanceCycle(_))));
}

#[test]
fn two_node_cycle_is_detected() {
    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(blueprint("dcc.a", Some("dcc.b"))).unwrap();
    builder.register(blueprint("dcc.b", Some("dcc.a"))).unwrap();
    assert!(matches!(builder.build(), Err(RegistryError::InheritanceCycle(_))));
}

#[test]
fn resolve_merges_parent_properties_preserving_order() {
    let mut parent = blueprint("dcc.base", None);
    parent.properties.insert("a".into(), property("a"));
    parent.properties.insert("b".into(), property("b"));

    let mut child = blueprint("dcc.child", Some("dcc.base"));
    child.properties.insert("b".into(), property("b-overridden"));
    child.properties.insert("c".into(), property("c"));

    let mut builder = BlueprintRegistryBuilder::new();
    builder.register(parent).unwrap();
    builder.register(child).unwrap();
    let registry = builder.build().unwrap();

    let resolved = registry.resolve(&BlueprintId::new("dcc.child"), None).unwrap();
    let names: Vec<&str> = resolved.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(resolved.properties["b"].name, "b-overridden");
}

#[test]
fn resolve_unknown_blueprint_errors() {
    let registry = BlueprintRegistryBuilder::new().build().unwrap();
    assert!(matches!(registry.resolve(&BlueprintId::new("dcc.nope"), None), Err(RegistryError::UnknownBlueprint(_))));
}
