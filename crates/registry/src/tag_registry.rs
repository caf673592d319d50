// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A frozen `tag -> impl` map shared by the feature-validator,
//! transformer-factory, migrator, and peer-driver registries: one
//! dispatch-by-kind pattern generalized from a fixed set of kinds to an
//! open, extensible tag space.

use crate::error::RegistryError;
use std::collections::HashMap;
use std::sync::Arc;

/// A frozen, thread-safe `tag -> Arc<T>` map. Built once via
/// [`TagRegistryBuilder`] and never mutated afterwards, so lookups never
/// take a lock.
#[derive(Debug)]
pub struct TagRegistry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> Clone for TagRegistry<T> {
    fn clone(&self) -> Self {
        Self { kind: self.kind, entries: self.entries.clone() }
    }
}

pub struct TagRegistryBuilder<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> TagRegistryBuilder<T> {
    pub fn new(kind: &'static str) -> Self {
        Self { kind, entries: HashMap::new() }
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: Arc<T>) -> Result<&mut Self, RegistryError> {
        let tag = tag.into();
        if self.entries.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag { kind: self.kind, tag });
        }
        self.entries.insert(tag, value);
        Ok(self)
    }

    pub fn build(self) -> TagRegistry<T> {
        TagRegistry { kind: self.kind, entries: self.entries }
    }
}

impl<T: ?Sized> TagRegistry<T> {
    pub fn get(&self, tag: &str) -> Result<Arc<T>, RegistryError> {
        self.entries.get(tag).cloned().ok_or_else(|| RegistryError::UnknownTag { kind: self.kind, tag: tag.to_string() })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tag_registry_tests.rs"]
mod tests;
