// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ray / bounded segment used for tree and broad-phase raycasts.

use glam::Vec3;

/// A ray, or a bounded segment when `max_fraction` is finite.
///
/// `max_fraction = 1.0` with `direction = point2 - point1` means the
/// ray represents exactly the segment from `point1` to `point2`;
/// callbacks may shorten `max_fraction` to narrow the segment as
/// closer hits are found (see `strata_tree`'s raycast descent).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Ray direction. Not required to be normalized; `max_fraction = 1`
    /// always means "reaches exactly `origin + direction`".
    pub direction: Vec3,
    /// Fraction along `direction` after which the ray is no longer
    /// considered to hit anything. Shortened by raycast callbacks that
    /// report an intermediate hit.
    pub max_fraction: f32,
}

impl Ray {
    /// Build a ray representing the segment from `point1` to `point2`.
    #[inline]
    pub fn segment(point1: Vec3, point2: Vec3) -> Self {
        Self {
            origin: point1,
            direction: point2 - point1,
            max_fraction: 1.0,
        }
    }

    /// The point at parameter `fraction` along the ray, `fraction` in `[0, max_fraction]`.
    #[inline]
    pub fn point_at(&self, fraction: f32) -> Vec3 {
        self.origin + self.direction * fraction
    }

    /// The current endpoint, i.e. `point_at(self.max_fraction)`.
    #[inline]
    pub fn end_point(&self) -> Vec3 {
        self.point_at(self.max_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_reaches_point2_at_fraction_one() {
        let r = Ray::segment(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        assert!((r.end_point() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn point_at_half_is_midpoint() {
        let r = Ray::segment(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0));
        assert!((r.point_at(0.5) - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }
}
