// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dense, enabled/disabled-partitioned proxy-shape column.

use alloc::vec::Vec;

use strata_math::Isometry;

use crate::entity::Entity;
use crate::shape::ShapeHandle;

/// One proxy shape's attributes.
///
/// `broad_phase_id` is `-1` when the proxy has not (or no longer) been
/// registered with a broad-phase tree; `strata_broadphase` is the only
/// crate that writes a non-`-1` value here.
#[derive(Clone, Debug)]
pub struct ProxyShapeRow {
    /// This row's own entity, so a row can be traced back from a swap.
    pub entity: Entity,
    /// The rigid body this shape is attached to.
    pub body_entity: Entity,
    /// Shared reference to the shape's immutable geometry.
    pub collision_shape: ShapeHandle,
    /// Rigid offset of the shape within its body.
    pub local_to_body: Isometry,
    /// This proxy's leaf in the broad-phase tree, or `-1` if unindexed.
    pub broad_phase_id: i32,
    /// Collision category bits this shape belongs to.
    pub category_bits: u16,
    /// Mask of categories this shape is willing to collide with.
    pub mask_bits: u16,
    /// Opaque engine-owned payload, untouched by this crate.
    pub user_data: u64,
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    generation: u32,
    row: usize,
}

/// Dense array of [`ProxyShapeRow`]s, partitioned into an enabled prefix
/// `0..enabled_count` and a disabled suffix, with an `Entity -> row`
/// lookup kept in sync on every mutation.
///
/// Per the data model: rows `0..N` hold all live components; a prefix
/// `0..E` is enabled (`E <= N`); the entity-to-row map agrees with array
/// position; swap-remove preserves both invariants; disabled rows are
/// skipped by the per-step update loop (`enabled_rows`/`enabled_rows_mut`
/// only ever expose the prefix).
#[derive(Debug, Default)]
pub struct ProxyShapeComponents {
    rows: Vec<ProxyShapeRow>,
    index_of: Vec<Option<Slot>>,
    enabled_count: usize,
}

impl ProxyShapeComponents {
    /// Create an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of live rows (`N`).
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of enabled rows (`E`). Invariant: `enabled_count() <=
    /// total_count()`.
    #[inline]
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled_count
    }

    /// The enabled prefix, in row order.
    #[inline]
    #[must_use]
    pub fn enabled_rows(&self) -> &[ProxyShapeRow] {
        &self.rows[..self.enabled_count]
    }

    /// The enabled prefix, mutable.
    #[inline]
    pub fn enabled_rows_mut(&mut self) -> &mut [ProxyShapeRow] {
        &mut self.rows[..self.enabled_count]
    }

    /// Insert a new row, enabled by default.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert`) if `entity` already has a row, which
    /// is a caller contract violation.
    pub fn insert(&mut self, entity: Entity, row: ProxyShapeRow) {
        debug_assert!(
            !self.contains(entity),
            "entity already has a proxy-shape row"
        );
        debug_assert_eq!(
            row.entity, entity,
            "row.entity must match the entity it is inserted under"
        );

        let new_row = self.rows.len();
        self.rows.push(row);
        self.set_slot(entity, new_row);

        // Promote into the enabled prefix by swapping with whatever
        // currently sits at the boundary.
        self.swap_rows(new_row, self.enabled_count);
        self.enabled_count += 1;
    }

    /// Remove the row for `entity`, swap-removing from whichever
    /// partition it currently occupies.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert`) if `entity` has no row.
    pub fn remove(&mut self, entity: Entity) -> ProxyShapeRow {
        let mut pos = self
            .row_index(entity)
            .expect("remove called on an entity with no proxy-shape row");

        if pos < self.enabled_count {
            let last_enabled = self.enabled_count - 1;
            self.swap_rows(pos, last_enabled);
            self.enabled_count -= 1;
            pos = last_enabled;
        }

        let last = self.rows.len() - 1;
        self.swap_rows(pos, last);
        let removed = self.rows.pop().expect("row count must be nonzero here");
        self.index_of[removed.entity.index() as usize] = None;
        removed
    }

    /// Enable or disable `entity`'s row, moving it across the partition
    /// boundary.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert`) if `entity` has no row.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        let row = self
            .row_index(entity)
            .expect("set_enabled called on an entity with no proxy-shape row");
        let currently_enabled = row < self.enabled_count;
        if enabled == currently_enabled {
            return;
        }
        if enabled {
            self.swap_rows(row, self.enabled_count);
            self.enabled_count += 1;
        } else {
            self.swap_rows(row, self.enabled_count - 1);
            self.enabled_count -= 1;
        }
    }

    /// Whether `entity` currently has a row.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.row_index(entity).is_some()
    }

    /// Read `entity`'s row, if any.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&ProxyShapeRow> {
        let row = self.row_index(entity)?;
        Some(&self.rows[row])
    }

    /// Mutably access `entity`'s row, if any.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut ProxyShapeRow> {
        let row = self.row_index(entity)?;
        Some(&mut self.rows[row])
    }

    fn row_index(&self, entity: Entity) -> Option<usize> {
        self.index_of
            .get(entity.index() as usize)?
            .filter(|slot| slot.generation == entity.generation())
            .map(|slot| slot.row)
    }

    fn set_slot(&mut self, entity: Entity, row: usize) {
        let index = entity.index() as usize;
        if index >= self.index_of.len() {
            self.index_of.resize_with(index + 1, || None);
        }
        self.index_of[index] = Some(Slot {
            generation: entity.generation(),
            row,
        });
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.rows.swap(a, b);
        let entity_a = self.rows[a].entity;
        let entity_b = self.rows[b].entity;
        self.set_slot(entity_a, a);
        self.set_slot(entity_b, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityAllocator;
    use crate::shape::{CollisionShape, RaycastHit};
    use alloc::sync::Arc;
    use strata_math::glam::Vec3;
    use strata_math::{Aabb3, Ray};

    struct DummyShape;

    impl CollisionShape for DummyShape {
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
            local_point.length_squared() <= 0.25
        }
    }

    fn row(entity: Entity, body: Entity) -> ProxyShapeRow {
        ProxyShapeRow {
            entity,
            body_entity: body,
            collision_shape: Arc::new(DummyShape),
            local_to_body: Isometry::IDENTITY,
            broad_phase_id: -1,
            category_bits: 0xFFFF,
            mask_bits: 0xFFFF,
            user_data: 0,
        }
    }

    #[test]
    fn insert_is_enabled_by_default() {
        let mut allocator = EntityAllocator::new();
        let mut proxies = ProxyShapeComponents::new();
        let shape = allocator.spawn();
        let body = allocator.spawn();
        proxies.insert(shape, row(shape, body));

        assert_eq!(proxies.total_count(), 1);
        assert_eq!(proxies.enabled_count(), 1);
        assert!(proxies.get(shape).is_some());
    }

    #[test]
    fn disable_then_enable_moves_across_partition() {
        let mut allocator = EntityAllocator::new();
        let mut proxies = ProxyShapeComponents::new();
        let body = allocator.spawn();
        let a = allocator.spawn();
        let b = allocator.spawn();
        proxies.insert(a, row(a, body));
        proxies.insert(b, row(b, body));
        assert_eq!(proxies.enabled_count(), 2);

        proxies.set_enabled(a, false);
        assert_eq!(proxies.enabled_count(), 1);
        assert!(proxies.enabled_rows().iter().all(|r| r.entity != a));

        proxies.set_enabled(a, true);
        assert_eq!(proxies.enabled_count(), 2);
    }

    #[test]
    fn remove_preserves_partition_invariant() {
        let mut allocator = EntityAllocator::new();
        let mut proxies = ProxyShapeComponents::new();
        let body = allocator.spawn();
        let mut entities = Vec::new();
        for _ in 0..5 {
            let e = allocator.spawn();
            proxies.insert(e, row(e, body));
            entities.push(e);
        }
        proxies.set_enabled(entities[0], false);
        proxies.set_enabled(entities[1], false);
        assert_eq!(proxies.enabled_count(), 3);

        proxies.remove(entities[2]);
        assert_eq!(proxies.total_count(), 4);
        assert!(proxies.enabled_count() <= proxies.total_count());
        assert!(!proxies.contains(entities[2]));
        for &e in &[entities[0], entities[1], entities[3], entities[4]] {
            assert!(proxies.contains(e));
        }
    }

    #[test]
    fn removing_an_enabled_row_keeps_remaining_enabled_rows_enabled() {
        let mut allocator = EntityAllocator::new();
        let mut proxies = ProxyShapeComponents::new();
        let body = allocator.spawn();
        let entities: Vec<Entity> = (0..4)
            .map(|_| {
                let e = allocator.spawn();
                proxies.insert(e, row(e, body));
                e
            })
            .collect();

        proxies.remove(entities[1]);
        assert_eq!(proxies.enabled_count(), 3);
        assert_eq!(proxies.total_count(), 3);
        for row in proxies.enabled_rows() {
            assert_ne!(row.entity, entities[1]);
        }
    }
}
