// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The proxy-shape view: a per-instance facade an engine user holds for
//! one shape, forwarding attribute access to the component column and
//! notifying the broad-phase on geometric change.

use strata_ecs::{CollisionShape, Entity, ProxyShapeComponents, RaycastHit, TransformComponents};
use strata_math::glam::Vec3;
use strata_math::{Aabb3, Isometry, Ray};

use crate::broad_phase::BroadPhase;
use crate::world_shape_transform;

/// Capability an embedding engine implements so [`ProxyShapeView`] can
/// query and clear a body's sleeping flag without this crate owning any
/// sleeping/island bookkeeping itself (explicitly out of scope for this
/// subsystem).
///
/// A minimal engine with no sleeping system can implement this as
/// "always active, wake is a no-op".
pub trait BodyActivity {
    /// Whether `body` is currently simulated (not asleep/inactive).
    fn is_active(&self, body: Entity) -> bool;

    /// Clear `body`'s sleeping flag, if it has one.
    fn wake(&mut self, body: Entity);
}

/// A per-shape facade: forwards attribute reads/writes to the
/// proxy-shape component column and keeps the broad-phase's tree in sync
/// on geometric change.
///
/// Per the design notes, this holds an entity id and references to the
/// collaborating stores directly, rather than a pointer chain back
/// through an owning body to a world.
pub struct ProxyShapeView<'a, A> {
    entity: Entity,
    proxies: &'a mut ProxyShapeComponents,
    transforms: &'a TransformComponents,
    broad_phase: &'a mut BroadPhase,
    activity: &'a mut A,
}

impl<'a, A: BodyActivity> ProxyShapeView<'a, A> {
    /// Build a view over `entity`'s row.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no proxy-shape row.
    pub fn new(
        entity: Entity,
        proxies: &'a mut ProxyShapeComponents,
        transforms: &'a TransformComponents,
        broad_phase: &'a mut BroadPhase,
        activity: &'a mut A,
    ) -> Self {
        debug_assert!(
            proxies.contains(entity),
            "ProxyShapeView constructed over an entity with no proxy-shape row"
        );
        Self {
            entity,
            proxies,
            transforms,
            broad_phase,
            activity,
        }
    }

    /// The entity this view is over.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The body this shape is attached to.
    #[must_use]
    pub fn body_entity(&self) -> Entity {
        self.row().body_entity
    }

    /// This shape's current rigid offset within its body.
    #[must_use]
    pub fn local_to_body_transform(&self) -> Isometry {
        self.row().local_to_body
    }

    /// Set this shape's rigid offset within its body.
    ///
    /// Per the spec's reproduced asymmetry (see the crate-level open
    /// question notes): this wakes the owning body and pushes the
    /// geometric change to the broad-phase. [`Self::set_collision_category_bits`]
    /// and [`Self::set_collide_with_mask_bits`] deliberately do neither.
    pub fn set_local_to_body_transform(&mut self, new_transform: Isometry) {
        let body = self.row().body_entity;
        self.proxies.get_mut(self.entity).expect("row must exist").local_to_body = new_transform;
        self.activity.wake(body);
        self.broad_phase.update_proxy_shape(
            self.proxies,
            self.transforms,
            None,
            0.0,
            self.entity,
        );
    }

    /// This shape's current collision category bits.
    #[must_use]
    pub fn collision_category_bits(&self) -> u16 {
        self.row().category_bits
    }

    /// Set this shape's collision category bits. Filter-only: does not
    /// touch the broad-phase tree or wake the body.
    pub fn set_collision_category_bits(&mut self, bits: u16) {
        self.proxies.get_mut(self.entity).expect("row must exist").category_bits = bits;
    }

    /// This shape's current collide-with mask bits.
    #[must_use]
    pub fn collide_with_mask_bits(&self) -> u16 {
        self.row().mask_bits
    }

    /// Set this shape's collide-with mask bits. Filter-only: does not
    /// touch the broad-phase tree or wake the body.
    pub fn set_collide_with_mask_bits(&mut self, bits: u16) {
        self.proxies.get_mut(self.entity).expect("row must exist").mask_bits = bits;
    }

    /// This shape's current world-space AABB, recomputed from its
    /// body's transform and local offset.
    #[must_use]
    pub fn world_aabb(&self) -> Aabb3<f32> {
        let row = self.row();
        let world_transform = world_shape_transform(self.body_world_transform(), row);
        row.collision_shape.compute_aabb(world_transform)
    }

    /// Cast `world_ray` against this single shape.
    ///
    /// Returns `None` immediately if the owning body is inactive.
    /// Otherwise composes the world-to-shape transform, maps the ray
    /// into the shape's local space, delegates to the shape's own
    /// raycast, and maps the hit point and (renormalized) normal back to
    /// world space.
    #[must_use]
    pub fn raycast(&self, world_ray: Ray) -> Option<RaycastHit> {
        let row = self.row();
        if !self.activity.is_active(row.body_entity) {
            return None;
        }

        let world_transform = world_shape_transform(self.body_world_transform(), row);
        let local_ray = Ray {
            origin: world_transform.inverse_transform_point(world_ray.origin),
            direction: world_transform.inverse_transform_vector(world_ray.direction),
            max_fraction: world_ray.max_fraction,
        };

        let local_hit = row.collision_shape.raycast_local(local_ray)?;
        Some(RaycastHit {
            fraction: local_hit.fraction,
            point: world_transform.transform_point(local_hit.point),
            normal: (world_transform.rotation * local_hit.normal).normalize_or_zero(),
        })
    }

    /// Whether `world_point` lies inside this shape.
    #[must_use]
    pub fn test_point_inside(&self, world_point: Vec3) -> bool {
        let row = self.row();
        let world_transform = world_shape_transform(self.body_world_transform(), row);
        let local_point = world_transform.inverse_transform_point(world_point);
        row.collision_shape.test_point_inside_local(local_point)
    }

    fn row(&self) -> &strata_ecs::ProxyShapeRow {
        self.proxies
            .get(self.entity)
            .expect("ProxyShapeView's entity must keep its row for the view's lifetime")
    }

    fn body_world_transform(&self) -> Isometry {
        self.transforms
            .get(self.row().body_entity)
            .expect("proxy shape's body has no recorded world transform")
    }
}
