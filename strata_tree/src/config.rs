// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable constants for the dynamic AABB tree.

/// Tunable constants controlling fat-AABB margin, displacement
/// prediction and initial node-array capacity.
///
/// Grouped into a `Copy` config struct (rather than bare module
/// constants) so an embedding engine can tune per-world behavior
/// without a cargo feature.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// Margin added to every axis of a leaf's tight AABB to produce its
    /// fat AABB. Default `0.08` world units.
    pub fat_aabb_margin: f32,
    /// Multiplier applied to a leaf's displacement vector before it is
    /// used to bias the fat AABB's growth direction during
    /// [`crate::DynamicAabbTree::update_object`]. Default `2.0`.
    pub displacement_prediction: f32,
    /// Initial capacity of the node arena before its first growth.
    /// Default `8`.
    pub initial_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fat_aabb_margin: 0.08,
            displacement_prediction: 2.0,
            initial_capacity: 8,
        }
    }
}
