// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The broad-phase system: owns the tree, tracks the moved-shape set,
//! recomputes world AABBs and generates the deduplicated overlapping-pair
//! stream.

use alloc::vec::Vec;

use strata_ecs::{Entity, ProxyShapeComponents, TransformComponents, VelocityComponents};
use strata_math::glam::Vec3;
use strata_math::{Aabb3, Ray};
use strata_tree::{DynamicAabbTree, NodeId, NULL_NODE};

use crate::config::BroadPhaseConfig;
use crate::moved_set::MovedShapeSet;
use crate::world_shape_transform;

/// Owns the dynamic AABB tree and produces, once per simulation step, the
/// set of overlapping proxy-shape pairs belonging to different bodies.
///
/// Tree leaves are keyed by the proxy shape's [`Entity`]; the leaf's node
/// id is mirrored onto [`strata_ecs::ProxyShapeRow::broad_phase_id`] so
/// `-1` there always means "not currently indexed" (see the data model).
pub struct BroadPhase {
    tree: DynamicAabbTree<Entity>,
    moved: MovedShapeSet,
    scratch: Vec<NodeId>,
    pair_buffer: Vec<(NodeId, NodeId)>,
    config: BroadPhaseConfig,
}

impl BroadPhase {
    /// Create an empty broad-phase with the given configuration.
    #[must_use]
    pub fn new(config: BroadPhaseConfig) -> Self {
        Self {
            tree: DynamicAabbTree::new(config.tree),
            moved: MovedShapeSet::new(),
            scratch: Vec::new(),
            pair_buffer: Vec::new(),
            config,
        }
    }

    /// This broad-phase's configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> BroadPhaseConfig {
        self.config
    }

    /// Number of leaves currently indexed in the tree.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Number of entries currently recorded in the moved-shape set
    /// (may count a node id more than once; see [`MovedShapeSet`]).
    #[inline]
    #[must_use]
    pub fn moved_set_len(&self) -> usize {
        self.moved.len()
    }

    /// Register `shape_entity` with the tree using `initial_world_aabb`,
    /// recording the returned node id on its component row and marking
    /// it moved.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert`) if `shape_entity` has no proxy-shape
    /// row, or if it is already indexed (`broad_phase_id != -1`) — a
    /// caller contract violation per the spec's error-handling policy.
    pub fn add_proxy_collision_shape(
        &mut self,
        proxies: &mut ProxyShapeComponents,
        shape_entity: Entity,
        initial_world_aabb: Aabb3<f32>,
    ) {
        let row = proxies
            .get_mut(shape_entity)
            .expect("add_proxy_collision_shape called on an entity with no proxy-shape row");
        debug_assert_eq!(
            row.broad_phase_id, NULL_NODE,
            "proxy shape is already indexed in the broad-phase"
        );

        let node_id = self.tree.add_object(initial_world_aabb, shape_entity);
        row.broad_phase_id = node_id;
        self.moved.insert(node_id);
    }

    /// Unregister `shape_entity`: clears its node id back to `-1`, frees
    /// the tree leaf, and drops it from the moved-shape set.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert`) if `shape_entity` has no row, or if it
    /// is not currently indexed.
    pub fn remove_proxy_collision_shape(
        &mut self,
        proxies: &mut ProxyShapeComponents,
        shape_entity: Entity,
    ) {
        let row = proxies
            .get_mut(shape_entity)
            .expect("remove_proxy_collision_shape called on an entity with no proxy-shape row");
        let node_id = row.broad_phase_id;
        debug_assert_ne!(
            node_id, NULL_NODE,
            "proxy shape is not currently indexed in the broad-phase"
        );
        row.broad_phase_id = NULL_NODE;

        self.tree.remove_object(node_id);
        self.moved.remove_all(node_id);
    }

    /// Recompute `shape_entity`'s world AABB from its body's transform
    /// and local offset, and feed it to `tree.update_object`. If the
    /// tree reports a re-insertion, marks the leaf moved.
    ///
    /// `dt` and `velocities` are only consulted when
    /// [`BroadPhaseConfig::predict_displacement`] is enabled; pass `dt =
    /// 0.0` and `velocities = None` otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `shape_entity` has no row, is not indexed, or its
    /// body has no recorded transform.
    pub fn update_proxy_shape(
        &mut self,
        proxies: &ProxyShapeComponents,
        transforms: &TransformComponents,
        velocities: Option<&VelocityComponents>,
        dt: f32,
        shape_entity: Entity,
    ) {
        let row = proxies
            .get(shape_entity)
            .expect("update_proxy_shape called on an entity with no proxy-shape row");
        debug_assert_ne!(
            row.broad_phase_id, NULL_NODE,
            "update_proxy_shape called on an unindexed proxy shape"
        );

        let body_transform = transforms
            .get(row.body_entity)
            .expect("proxy shape's body has no recorded world transform");
        let world_transform = world_shape_transform(body_transform, row);
        let world_aabb = row.collision_shape.compute_aabb(world_transform);

        let displacement = if self.config.predict_displacement {
            velocities.map_or(Vec3::ZERO, |v| v.get(row.body_entity) * dt)
        } else {
            Vec3::ZERO
        };

        if self
            .tree
            .update_object(row.broad_phase_id, world_aabb, displacement)
        {
            self.moved.insert(row.broad_phase_id);
        }
    }

    /// Recompute world AABBs for every enabled proxy shape, as
    /// [`Self::update_proxy_shape`] but iterated over the enabled prefix
    /// of the component column.
    pub fn update_proxy_shapes(
        &mut self,
        proxies: &ProxyShapeComponents,
        transforms: &TransformComponents,
        velocities: Option<&VelocityComponents>,
        dt: f32,
    ) {
        for row in proxies.enabled_rows() {
            if row.broad_phase_id == NULL_NODE {
                continue;
            }
            let body_transform = transforms
                .get(row.body_entity)
                .expect("proxy shape's body has no recorded world transform");
            let world_transform = world_shape_transform(body_transform, row);
            let world_aabb = row.collision_shape.compute_aabb(world_transform);

            let displacement = if self.config.predict_displacement {
                velocities.map_or(Vec3::ZERO, |v| v.get(row.body_entity) * dt)
            } else {
                Vec3::ZERO
            };

            if self
                .tree
                .update_object(row.broad_phase_id, world_aabb, displacement)
            {
                self.moved.insert(row.broad_phase_id);
            }
        }
    }

    /// Whether `a` and `b`'s fat AABBs currently overlap. `false` if
    /// either shape is not indexed.
    #[must_use]
    pub fn test_overlapping_shapes(
        &self,
        proxies: &ProxyShapeComponents,
        a: Entity,
        b: Entity,
    ) -> bool {
        let (Some(row_a), Some(row_b)) = (proxies.get(a), proxies.get(b)) else {
            return false;
        };
        if row_a.broad_phase_id == NULL_NODE || row_b.broad_phase_id == NULL_NODE {
            return false;
        }
        self.tree
            .get_fat_aabb(row_a.broad_phase_id)
            .overlaps(&self.tree.get_fat_aabb(row_b.broad_phase_id))
    }

    /// Cast `ray` through the tree, filtering out shapes whose collision
    /// category bits AND `category_mask` is zero before forwarding
    /// surviving leaves to `raycast_test`. `raycast_test`'s return value
    /// shortens the ray exactly as `strata_tree::DynamicAabbTree::raycast`'s
    /// callback does.
    pub fn raycast(
        &self,
        proxies: &ProxyShapeComponents,
        ray: Ray,
        category_mask: u16,
        mut raycast_test: impl FnMut(Entity, &Ray) -> f32,
    ) {
        self.tree.raycast(ray, |shape_entity, local_ray| {
            let Some(row) = proxies.get(shape_entity) else {
                return -1.0;
            };
            if row.category_bits & category_mask == 0 {
                return -1.0;
            }
            raycast_test(shape_entity, local_ray)
        });
    }

    /// Translate every indexed leaf's fat AABB by `delta`, for an
    /// embedding engine rebasing a floating-origin world. Does not touch
    /// the moved-shape set: a pure origin shift does not change any
    /// shape's position relative to any other, so no new overlaps can
    /// appear from this call alone.
    pub fn shift_origin(&mut self, delta: Vec3) {
        self.tree.shift_origin(delta);
    }

    /// The pair-generation sweep: for every moved leaf, collects
    /// overlapping candidates, canonicalizes and dedups the resulting
    /// pairs, and calls `notify(shape_a, shape_b)` for each unique pair
    /// whose two proxies belong to different bodies. Clears the
    /// moved-shape set on return.
    pub fn compute_overlapping_pairs(
        &mut self,
        proxies: &ProxyShapeComponents,
        mut notify: impl FnMut(Entity, Entity),
    ) {
        self.pair_buffer.clear();

        for m in self.moved.iter() {
            if m == NULL_NODE {
                continue;
            }
            let query = self.tree.get_fat_aabb(m);
            self.scratch.clear();
            self.tree.report_overlapping_leaf_ids(query, &mut self.scratch);
            for &o in &self.scratch {
                if o != m {
                    self.pair_buffer.push((m.min(o), m.max(o)));
                }
            }
        }
        self.scratch.clear();

        self.pair_buffer.sort_unstable();

        let mut i = 0;
        while i < self.pair_buffer.len() {
            let pair = self.pair_buffer[i];
            let mut j = i + 1;
            while j < self.pair_buffer.len() && self.pair_buffer[j] == pair {
                j += 1;
            }

            let shape_a = self.tree.get_payload(pair.0);
            let shape_b = self.tree.get_payload(pair.1);
            if let (Some(row_a), Some(row_b)) = (proxies.get(shape_a), proxies.get(shape_b)) {
                if row_a.body_entity != row_b.body_entity {
                    notify(shape_a, shape_b);
                }
            }

            i = j;
        }

        self.moved.clear();
    }
}

impl core::fmt::Debug for BroadPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadPhase")
            .field("node_count", &self.node_count())
            .field("moved_set_len", &self.moved_set_len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use strata_ecs::{CollisionShape, Entity, EntityAllocator, ProxyShapeRow, RaycastHit};
    use strata_math::{Aabb3, Isometry, Ray};

    struct UnitCube;

    impl CollisionShape for UnitCube {
        fn compute_aabb(&self, transform: Isometry) -> Aabb3<f32> {
            let c = transform.translation;
            Aabb3::new(
                [c.x - 0.5, c.y - 0.5, c.z - 0.5],
                [c.x + 0.5, c.y + 0.5, c.z + 0.5],
            )
        }

        fn raycast_local(&self, _local_ray: Ray) -> Option<RaycastHit> {
            None
        }

        fn test_point_inside_local(&self, local_point: Vec3) -> bool {
            local_point.x.abs() <= 0.5 && local_point.y.abs() <= 0.5 && local_point.z.abs() <= 0.5
        }
    }

    struct World {
        entities: EntityAllocator,
        proxies: ProxyShapeComponents,
        transforms: TransformComponents,
    }

    impl World {
        fn new() -> Self {
            Self {
                entities: EntityAllocator::new(),
                proxies: ProxyShapeComponents::new(),
                transforms: TransformComponents::new(),
            }
        }

        fn spawn_cube(&mut self, body: Entity, position: Vec3) -> Entity {
            let shape = self.entities.spawn();
            self.proxies.insert(
                shape,
                ProxyShapeRow {
                    entity: shape,
                    body_entity: body,
                    collision_shape: Arc::new(UnitCube),
                    local_to_body: Isometry::IDENTITY,
                    broad_phase_id: NULL_NODE,
                    category_bits: 0xFFFF,
                    mask_bits: 0xFFFF,
                    user_data: 0,
                },
            );
            self.transforms.set(body, Isometry::from_translation(position));
            shape
        }
    }

    fn aabb_at(position: Vec3) -> Aabb3<f32> {
        UnitCube.compute_aabb(Isometry::from_translation(position))
    }

    #[test]
    fn s1_moving_middle_leaf_produces_exactly_one_pair() {
        let mut world = World::new();
        let body0 = world.entities.spawn();
        let body1 = world.entities.spawn();
        let body2 = world.entities.spawn();

        let shape0 = world.spawn_cube(body0, Vec3::new(0.0, 0.0, 0.0));
        let shape1 = world.spawn_cube(body1, Vec3::new(5.0, 0.0, 0.0));
        let shape2 = world.spawn_cube(body2, Vec3::new(10.0, 0.0, 0.0));

        let mut bp = BroadPhase::new(BroadPhaseConfig::default());
        bp.add_proxy_collision_shape(&mut world.proxies, shape0, aabb_at(Vec3::new(0.0, 0.0, 0.0)));
        bp.add_proxy_collision_shape(&mut world.proxies, shape1, aabb_at(Vec3::new(5.0, 0.0, 0.0)));
        bp.add_proxy_collision_shape(&mut world.proxies, shape2, aabb_at(Vec3::new(10.0, 0.0, 0.0)));

        // First sweep (everything just added) isn't the scenario under
        // test; drain it first.
        bp.compute_overlapping_pairs(&world.proxies, |_, _| {});

        world.transforms.set(body1, Isometry::from_translation(Vec3::new(0.02, 0.0, 0.0)));
        bp.update_proxy_shape(&world.proxies, &world.transforms, None, 0.0, shape1);

        let mut pairs = Vec::new();
        bp.compute_overlapping_pairs(&world.proxies, |a, b| pairs.push((a, b)));

        assert_eq!(pairs.len(), 1);
        let (a, b) = pairs[0];
        assert!((a == shape0 && b == shape1) || (a == shape1 && b == shape0));
    }

    #[test]
    fn s2_same_body_pair_is_filtered() {
        let mut world = World::new();
        let body = world.entities.spawn();
        let shape0 = world.spawn_cube(body, Vec3::new(0.0, 0.0, 0.0));
        let shape1 = world.spawn_cube(body, Vec3::new(0.5, 0.0, 0.0));

        let mut bp = BroadPhase::new(BroadPhaseConfig::default());
        bp.add_proxy_collision_shape(&mut world.proxies, shape0, aabb_at(Vec3::new(0.0, 0.0, 0.0)));
        bp.add_proxy_collision_shape(&mut world.proxies, shape1, aabb_at(Vec3::new(0.5, 0.0, 0.0)));

        let mut pairs = Vec::new();
        bp.compute_overlapping_pairs(&world.proxies, |a, b| pairs.push((a, b)));
        assert!(pairs.is_empty());
    }

    #[test]
    fn moved_set_idempotence_does_not_duplicate_pairs() {
        let mut world = World::new();
        let body0 = world.entities.spawn();
        let body1 = world.entities.spawn();
        let shape0 = world.spawn_cube(body0, Vec3::new(0.0, 0.0, 0.0));
        let shape1 = world.spawn_cube(body1, Vec3::new(0.2, 0.0, 0.0));

        let mut bp = BroadPhase::new(BroadPhaseConfig::default());
        bp.add_proxy_collision_shape(&mut world.proxies, shape0, aabb_at(Vec3::new(0.0, 0.0, 0.0)));
        bp.add_proxy_collision_shape(&mut world.proxies, shape1, aabb_at(Vec3::new(0.2, 0.0, 0.0)));

        // Mark shape0's leaf moved several extra times beyond what
        // add_proxy_collision_shape already did.
        let node0 = world.proxies.get(shape0).unwrap().broad_phase_id;
        bp.moved.insert(node0);
        bp.moved.insert(node0);
        bp.moved.insert(node0);

        let mut pairs = Vec::new();
        bp.compute_overlapping_pairs(&world.proxies, |a, b| pairs.push((a, b)));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn remove_drops_stale_id_from_moved_set_before_next_sweep() {
        let mut world = World::new();
        let body0 = world.entities.spawn();
        let body1 = world.entities.spawn();
        let shape0 = world.spawn_cube(body0, Vec3::new(0.0, 0.0, 0.0));
        let shape1 = world.spawn_cube(body1, Vec3::new(0.2, 0.0, 0.0));

        let mut bp = BroadPhase::new(BroadPhaseConfig::default());
        bp.add_proxy_collision_shape(&mut world.proxies, shape0, aabb_at(Vec3::new(0.0, 0.0, 0.0)));
        bp.add_proxy_collision_shape(&mut world.proxies, shape1, aabb_at(Vec3::new(0.2, 0.0, 0.0)));

        bp.remove_proxy_collision_shape(&mut world.proxies, shape0);
        assert_eq!(bp.moved_set_len(), 1);

        let mut pairs = Vec::new();
        bp.compute_overlapping_pairs(&world.proxies, |a, b| pairs.push((a, b)));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_overlapping_shapes_is_false_for_unindexed_shape() {
        let mut world = World::new();
        let body0 = world.entities.spawn();
        let body1 = world.entities.spawn();
        let shape0 = world.spawn_cube(body0, Vec3::new(0.0, 0.0, 0.0));
        let shape1 = world.spawn_cube(body1, Vec3::new(0.2, 0.0, 0.0));

        let bp = BroadPhase::new(BroadPhaseConfig::default());
        assert!(!bp.test_overlapping_shapes(&world.proxies, shape0, shape1));
    }

    #[test]
    fn raycast_filters_by_category_mask() {
        let mut world = World::new();
        let body = world.entities.spawn();
        let shape = world.spawn_cube(body, Vec3::new(0.0, 0.0, 0.0));

        let mut bp = BroadPhase::new(BroadPhaseConfig::default());
        bp.add_proxy_collision_shape(&mut world.proxies, shape, aabb_at(Vec3::new(0.0, 0.0, 0.0)));
        world.proxies.get_mut(shape).unwrap().category_bits = 0x0001;

        let ray = Ray::segment(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let mut invocations = 0;
        bp.raycast(&world.proxies, ray, 0x0002, |_, _| {
            invocations += 1;
            -1.0
        });
        assert_eq!(invocations, 0);

        let mut invocations_matching = 0;
        bp.raycast(&world.proxies, ray, 0x0001, |_, _| {
            invocations_matching += 1;
            -1.0
        });
        assert_eq!(invocations_matching, 1);
    }
}
