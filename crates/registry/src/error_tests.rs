// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn inheritance_cycle_renders_the_chain() {
    let err = RegistryError::InheritanceCycle(vec![BlueprintId::new("a"), BlueprintId::new("b"), BlueprintId::new("a")]);
    assert_eq!(err.to_string(), "inheritance cycle detected: a -> b -> a");
}

#[test]
fn duplicate_tag_names_the_kind() {
    let err = RegistryError::DuplicateTag { kind: "feature validator", tag: "lifecycle".into() };
    assert!(err.to_string().contains("feature validator"));
    assert!(err.to_string().contains("lifecycle"));
}
