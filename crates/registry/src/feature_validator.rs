// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The feature-validator registry: an extension point letting
//! third parties validate `Feature::Custom` tags (and impose extra
//! constraints on built-in features) against the blueprint declaring them,
//! without the core crate knowing about every feature tag that exists.

use crate::tag_registry::{TagRegistry, TagRegistryBuilder};
use dcc_core::{DeviceBlueprint, Feature};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature '{tag}' is invalid: {message}")]
pub struct FeatureValidationFailure {
    pub tag: String,
    pub message: String,
}

/// Validates a single feature declaration against the blueprint it's
/// attached to. Implementations are registered by the feature's `tag()`
///.
pub trait FeatureValidator: Send + Sync {
    fn validate(&self, blueprint: &DeviceBlueprint, feature: &Feature) -> Result<(), FeatureValidationFailure>;
}

pub type FeatureValidatorRegistry = TagRegistry<dyn FeatureValidator>;
pub type FeatureValidatorRegistryBuilder = TagRegistryBuilder<dyn FeatureValidator>;

/// Validates every feature on `blueprint` against the registered
/// validator for its tag; features with no registered validator pass
/// (the registry is opt-in, not a closed allow-list).
pub fn validate_all(registry: &FeatureValidatorRegistry, blueprint: &DeviceBlueprint) -> Result<(), FeatureValidationFailure> {
    for feature in blueprint.features.values() {
        if let Ok(validator) = registry.get(feature.tag()) {
            validator.validate(blueprint, feature)?;
        }
    }
    Ok(())
}

/// Built-in validator for `OperationalFsm`: the declared `initial` state
/// must be one of `states`.
pub struct OperationalFsmValidator;

impl FeatureValidator for OperationalFsmValidator {
    fn validate(&self, _blueprint: &DeviceBlueprint, feature: &Feature) -> Result<(), FeatureValidationFailure> {
        let Feature::OperationalFsm { states, initial } = feature else {
            return Ok(());
        };
        if !states.iter().any(|s| s == initial) {
            return Err(FeatureValidationFailure {
                tag: "operationalFsm".into(),
                message: format!("initial state '{initial}' is not in declared states {states:?}"),
            });
        }
        Ok(())
    }
}

pub fn builtin_feature_validators() -> Result<FeatureValidatorRegistry, crate::error::RegistryError> {
    let mut builder = FeatureValidatorRegistryBuilder::new("feature validator");
    builder.insert("operationalFsm", Arc::new(OperationalFsmValidator))?;
    Ok(builder.build())
}

#[cfg(test)]
#[path = "feature_validator_tests.rs"]
mod tests;
