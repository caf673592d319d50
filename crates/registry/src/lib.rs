// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registries: the blueprint registry plus
//! the feature-validator, property-transformer, migrator, and peer-driver
//! extension-point registries. Every registry here follows the same
//! shape — build once at bootstrap, freeze behind an `Arc`, never mutate
//! again — so lookups are lock-free for the rest of the process lifetime.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod blueprint_registry;
pub mod error;
pub mod feature_validator;
pub mod migrator_registry;
pub mod peer_driver_registry;
pub mod tag_registry;
pub mod transformer_registry;

pub use blueprint_registry::{BlueprintRegistry, BlueprintRegistryBuilder};
pub use error::RegistryError;
pub use feature_validator::{
    builtin_feature_validators, validate_all, FeatureValidationFailure, FeatureValidator, FeatureValidatorRegistry,
    FeatureValidatorRegistryBuilder,
};
pub use migrator_registry::{MigratorRegistry, MigratorRegistryBuilder, StateMigrator};
pub use peer_driver_registry::{PeerDriverHandle, PeerDriverRegistry, PeerDriverRegistryBuilder};
pub use tag_registry::{TagRegistry, TagRegistryBuilder};
pub use transformer_registry::{resolve_builtin as resolve_builtin_transformer, PropertyTransformer, TransformerFactoryRegistry};
