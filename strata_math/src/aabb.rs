// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generic 3D axis-aligned bounding box.

use crate::scalar::{Scalar, ScalarAcc};

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3<T> {
    /// Minimum corner (smallest x, y, z).
    pub min: [T; 3],
    /// Maximum corner (largest x, y, z).
    pub max: [T; 3],
}

impl<T> Aabb3<T> {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min: [T; 3], max: [T; 3]) -> Self {
        Self { min, max }
    }
}

impl<T: Copy + PartialOrd> Aabb3<T> {
    /// Whether this AABB contains the point.
    #[inline]
    pub fn contains_point(&self, p: [T; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Whether this AABB fully contains `other`.
    #[inline]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// The boundary is considered part of the AABB, so two AABBs that
    /// only share a face are considered to overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Return true if the AABB is empty or inverted (no volume). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.max[i] <= self.min[i])
    }
}

impl<T: Scalar> Aabb3<T> {
    /// The smallest AABB enclosing two AABBs.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        let mut min = [T::zero(); 3];
        let mut max = [T::zero(); 3];
        for i in 0..3 {
            min[i] = T::min(self.min[i], other.min[i]);
            max[i] = T::max(self.max[i], other.max[i]);
        }
        Self { min, max }
    }

    /// Grow this AABB by `margin` on every axis, in both directions.
    #[inline]
    pub fn expanded(&self, margin: T) -> Self {
        let mut min = [T::zero(); 3];
        let mut max = [T::zero(); 3];
        for i in 0..3 {
            min[i] = T::sub(self.min[i], margin);
            max[i] = T::add(self.max[i], margin);
        }
        Self { min, max }
    }

    /// Half the surface area of the box: `dx*dy + dy*dz + dz*dx`.
    ///
    /// This is the metric the surface-area heuristic compares; the `2x`
    /// factor in the SAH cost formulas (see `strata_tree`) turns it into
    /// the full surface area. Computed in the widened accumulator type
    /// to keep cost comparisons stable across many nodes.
    #[inline]
    pub fn area(&self) -> ScalarAcc<T> {
        let dx = T::widen(T::max(T::sub(self.max[0], self.min[0]), T::zero()));
        let dy = T::widen(T::max(T::sub(self.max[1], self.min[1]), T::zero()));
        let dz = T::widen(T::max(T::sub(self.max[2], self.min[2]), T::zero()));
        dx * dy + dy * dz + dz * dx
    }
}
