// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-body world transform and (optional) linear velocity columns.

use strata_math::glam::Vec3;
use strata_math::Isometry;

use crate::component_store::SparseComponentStore;
use crate::entity::Entity;

/// Per-body world transform, keyed by body entity.
#[derive(Debug, Default)]
pub struct TransformComponents {
    store: SparseComponentStore<Isometry>,
}

impl TransformComponents {
    /// Create an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or insert) the world transform for `body`.
    pub fn set(&mut self, body: Entity, transform: Isometry) {
        self.store.insert(body, transform);
    }

    /// Read the world transform for `body`.
    #[must_use]
    pub fn get(&self, body: Entity) -> Option<Isometry> {
        self.store.get(body).copied()
    }

    /// Remove the world transform recorded for `body`.
    pub fn remove(&mut self, body: Entity) -> Option<Isometry> {
        self.store.remove(body)
    }
}

/// Per-body linear velocity, keyed by body entity.
///
/// Only consulted when `BroadPhaseConfig::predict_displacement` is
/// enabled; see the open-question resolution in the crate-level design
/// notes. Absent a stored velocity, callers should treat the body as
/// stationary for displacement-prediction purposes.
#[derive(Debug, Default)]
pub struct VelocityComponents {
    store: SparseComponentStore<Vec3>,
}

impl VelocityComponents {
    /// Create an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or insert) the linear velocity for `body`.
    pub fn set(&mut self, body: Entity, linear_velocity: Vec3) {
        self.store.insert(body, linear_velocity);
    }

    /// Read the linear velocity for `body`, or the zero vector if none
    /// has been recorded.
    #[must_use]
    pub fn get(&self, body: Entity) -> Vec3 {
        self.store.get(body).copied().unwrap_or(Vec3::ZERO)
    }

    /// Remove the linear velocity recorded for `body`.
    pub fn remove(&mut self, body: Entity) -> Option<Vec3> {
        self.store.remove(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityAllocator;

    #[test]
    fn transform_round_trips() {
        let mut allocator = EntityAllocator::new();
        let mut transforms = TransformComponents::new();
        let body = allocator.spawn();
        let t = Isometry::from_translation(Vec3::new(1.0, 2.0, 3.0));
        transforms.set(body, t);
        assert_eq!(transforms.get(body), Some(t));
    }

    #[test]
    fn velocity_defaults_to_zero() {
        let mut allocator = EntityAllocator::new();
        let velocities = VelocityComponents::new();
        let body = allocator.spawn();
        assert_eq!(velocities.get(body), Vec3::ZERO);
    }
}
