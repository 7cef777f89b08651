// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The collision-shape capability set shared by every proxy.

use alloc::sync::Arc;

use strata_math::glam::Vec3;
use strata_math::{Aabb3, Isometry, Ray};

/// A ray/shape intersection, in the coordinate space the query was
/// issued in (local or world, depending on the caller).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// Fraction along the ray, in `[0, ray.max_fraction]`.
    pub fraction: f32,
    /// World- or local-space hit point, matching `fraction`.
    pub point: Vec3,
    /// Surface normal at the hit point (not guaranteed unit length until
    /// the caller renormalizes after transforming it).
    pub normal: Vec3,
}

/// The geometry capability set every collision shape must provide:
/// computing its AABB under a transform, local-space raycasting, and
/// local-space point containment.
///
/// Per the design note on polymorphic shapes, concrete shape types (box,
/// sphere, capsule, mesh, ...) each implement this trait; proxies hold a
/// [`ShapeHandle`] rather than an enum, so new shape kinds can be added
/// without touching the proxy or broad-phase code.
pub trait CollisionShape {
    /// Compute this shape's axis-aligned bounding box under `transform`
    /// (typically `T_world_shape`).
    fn compute_aabb(&self, transform: Isometry) -> Aabb3<f32>;

    /// Cast `local_ray` (already in this shape's local space) against
    /// the shape's surface.
    fn raycast_local(&self, local_ray: Ray) -> Option<RaycastHit>;

    /// Whether `local_point` (already in this shape's local space) lies
    /// inside the shape.
    fn test_point_inside_local(&self, local_point: Vec3) -> bool;
}

/// A shared, immutable reference to a shape's geometry.
///
/// Per the concurrency model, a single shape may be referenced by many
/// proxies (e.g. instanced geometry); the shape itself never changes for
/// the duration of a step, only the proxy's pose does.
pub type ShapeHandle = Arc<dyn CollisionShape + Send + Sync>;
