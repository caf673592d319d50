// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The property-transformer factory registry: turns a
//! [`TransformerDescriptor`] into a live [`PropertyTransformer`] that maps a
//! parent value onto a bound child property.

use crate::tag_registry::{TagRegistry, TagRegistryBuilder};
use dcc_core::TransformerDescriptor;
use serde_json::Value;
use std::sync::Arc;

/// A live, resolved transformer. Stateless by contract — the same
/// transformer instance is shared across every binding using it.
pub trait PropertyTransformer: Send + Sync {
    fn apply(&self, input: &Value) -> Value;
}

pub type TransformerFactoryRegistry = TagRegistry<dyn Fn(&TransformerDescriptor) -> Arc<dyn PropertyTransformer> + Send + Sync>;
pub type TransformerFactoryRegistryBuilder =
    TagRegistryBuilder<dyn Fn(&TransformerDescriptor) -> Arc<dyn PropertyTransformer> + Send + Sync>;

struct LinearTransformer {
    scale: f64,
    offset: f64,
}

impl PropertyTransformer for LinearTransformer {
    fn apply(&self, input: &Value) -> Value {
        match input.as_f64() {
            Some(n) => Value::from(n * self.scale + self.offset),
            None => input.clone(),
        }
    }
}

struct ToStringTransformer;

impl PropertyTransformer for ToStringTransformer {
    fn apply(&self, input: &Value) -> Value {
        match input {
            Value::String(_) => input.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// Resolve a descriptor to a live transformer directly, for the two
/// built-in kinds that need no registry lookup; `Custom` descriptors go
/// through [`TransformerFactoryRegistry::get`].
pub fn resolve_builtin(descriptor: &TransformerDescriptor) -> Option<Arc<dyn PropertyTransformer>> {
    match descriptor {
        TransformerDescriptor::Linear { scale, offset } => Some(Arc::new(LinearTransformer { scale: *scale, offset: *offset })),
        TransformerDescriptor::ToString => Some(Arc::new(ToStringTransformer)),
        TransformerDescriptor::Custom { .. } => None,
    }
}

#[cfg(test)]
#[path = "transformer_registry_tests.rs"]
mod tests;
