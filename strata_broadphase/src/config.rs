// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable configuration for the broad-phase system.

pub use strata_tree::TreeConfig;

/// Tunable constants and feature toggles for [`crate::BroadPhase`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BroadPhaseConfig {
    /// Configuration forwarded to the underlying [`strata_tree::DynamicAabbTree`].
    pub tree: TreeConfig,
    /// Whether `update_proxy_shape`/`update_proxy_shapes` pass a
    /// `dt * linear_velocity` displacement to `tree.update_object`
    /// instead of the zero vector.
    ///
    /// Per the spec's open question on displacement: the reference
    /// always passes zero today despite documenting the intent to use
    /// per-body velocity. That hook exists here as `predict_displacement`
    /// but defaults to `false`, so enabling it is always an explicit
    /// opt-in by the embedding engine, never a silent behavior change.
    pub predict_displacement: bool,
}

impl Default for BroadPhaseConfig {
    fn default() -> Self {
        Self {
            tree: TreeConfig::default(),
            predict_displacement: false,
        }
    }
}
