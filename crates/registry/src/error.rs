// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while seeding or resolving the process-wide registries
//!.

use dcc_core::BlueprintId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("blueprint {0} is already registered")]
    DuplicateBlueprint(BlueprintId),

    #[error("blueprint {0} not found")]
    UnknownBlueprint(BlueprintId),

    #[error("blueprint {0} inherits from unknown blueprint {1}")]
    UnknownParent(BlueprintId, BlueprintId),

    #[error("inheritance cycle detected: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "))]
    InheritanceCycle(Vec<BlueprintId>),

    #[error("{kind} tag '{tag}' is already registered")]
    DuplicateTag { kind: &'static str, tag: String },

    #[error("no {kind} registered for tag '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
