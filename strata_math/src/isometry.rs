// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rigid transform (rotation + translation), used for body and
//! local-to-body shape transforms.

use glam::{Quat, Vec3};

/// A rigid transform: rotation followed by translation.
///
/// Bodies and shapes in this subsystem never scale or shear, so a
/// dedicated rotation+translation pair is used instead of a general
/// affine matrix; this also makes composing `T_body * local_to_body`
/// and inverting it for raycasts and point tests cheap and exact.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry {
    /// Translation component.
    pub translation: Vec3,
    /// Rotation component.
    pub rotation: Quat,
}

impl Isometry {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Construct from a translation and rotation.
    #[inline]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Construct a pure translation.
    #[inline]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Compose two transforms: applying the result to a point is the
    /// same as applying `rhs` first, then `self`.
    ///
    /// This is the operation `T_world_shape = T_body · local_to_body`
    /// uses.
    #[inline]
    pub fn compose(&self, rhs: &Self) -> Self {
        Self {
            rotation: self.rotation * rhs.rotation,
            translation: self.translation + self.rotation * rhs.translation,
        }
    }

    /// Transform a point from the local frame into this transform's
    /// outer frame.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Transform a direction vector (rotation only, no translation).
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// The inverse transform, such that `self.inverse().compose(&self)`
    /// is (numerically) the identity.
    #[inline]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.conjugate();
        Self {
            rotation: inv_rotation,
            translation: inv_rotation * -self.translation,
        }
    }

    /// Map a world-space point into this transform's local space.
    #[inline]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.conjugate() * (point - self.translation)
    }

    /// Map a world-space direction into this transform's local space.
    #[inline]
    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation.conjugate() * vector
    }
}

impl Default for Isometry {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn compose_then_inverse_recovers_identity() {
        let t = Isometry::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(FRAC_PI_2),
        );
        let round_trip = t.inverse().compose(&t);
        assert!(round_trip.translation.length() < 1e-5);
        assert!(round_trip.rotation.angle_between(Quat::IDENTITY) < 1e-5);
    }

    #[test]
    fn transform_point_matches_manual_rotation_then_translation() {
        let t = Isometry::new(Vec3::new(0.0, 0.0, 5.0), Quat::from_rotation_z(FRAC_PI_2));
        let p = t.transform_point(Vec3::new(1.0, 0.0, 0.0));
        // Rotating (1,0,0) by 90 degrees about Z gives (0,1,0), then + translation.
        assert!((p - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn inverse_transform_point_undoes_transform_point() {
        let t = Isometry::new(Vec3::new(3.0, -1.0, 2.0), Quat::from_rotation_x(0.7));
        let p = Vec3::new(4.0, 5.0, 6.0);
        let world = t.transform_point(p);
        let back = t.inverse_transform_point(world);
        assert!((back - p).length() < 1e-4);
    }
}
