// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A sparse, generation-checked `Entity -> T` map.
//!
//! Used for single-valued-per-entity columns (body transforms, optional
//! velocities) that don't need the proxy-shape column's dense
//! enabled/disabled partitioning; see [`crate::ProxyShapeComponents`] for
//! that one.

use alloc::vec::Vec;

use crate::entity::Entity;

/// `Entity -> T`, indexed by the entity's slot with a generation check on
/// every access so a despawned-and-reused entity can't read or overwrite
/// the wrong value.
#[derive(Debug)]
pub struct SparseComponentStore<T> {
    slots: Vec<Option<(u32, T)>>,
}

impl<T> Default for SparseComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseComponentStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert or overwrite the value for `entity`, returning the
    /// previous value if `entity`'s slot already held one at the same
    /// generation.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let previous = self.slots[index].take();
        self.slots[index] = Some((entity.generation(), value));
        previous.and_then(|(generation, old)| {
            (generation == entity.generation()).then_some(old)
        })
    }

    /// Remove and return the value for `entity`, if any is stored at its
    /// generation.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = entity.index() as usize;
        let slot = self.slots.get_mut(index)?;
        if slot.as_ref().is_some_and(|(g, _)| *g == entity.generation()) {
            slot.take().map(|(_, value)| value)
        } else {
            None
        }
    }

    /// Read the value stored for `entity`, if any is stored at its
    /// generation.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slots
            .get(entity.index() as usize)?
            .as_ref()
            .filter(|(g, _)| *g == entity.generation())
            .map(|(_, value)| value)
    }

    /// Mutably access the value stored for `entity`, if any is stored at
    /// its generation.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slots
            .get_mut(entity.index() as usize)?
            .as_mut()
            .filter(|(g, _)| *g == entity.generation())
            .map(|(_, value)| value)
    }

    /// Whether a value is currently stored for `entity`.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityAllocator;

    #[test]
    fn insert_then_get_round_trips() {
        let mut allocator = EntityAllocator::new();
        let mut store: SparseComponentStore<u32> = SparseComponentStore::new();
        let e = allocator.spawn();
        assert_eq!(store.insert(e, 7), None);
        assert_eq!(store.get(e), Some(&7));
    }

    #[test]
    fn stale_entity_after_despawn_and_reuse_does_not_alias() {
        let mut allocator = EntityAllocator::new();
        let mut store: SparseComponentStore<u32> = SparseComponentStore::new();
        let a = allocator.spawn();
        store.insert(a, 1);
        allocator.despawn(a);
        let b = allocator.spawn();
        assert_eq!(b.index(), a.index());

        assert_eq!(store.get(a), None);
        store.insert(b, 2);
        assert_eq!(store.get(b), Some(&2));
        assert_eq!(store.get(a), None);
    }

    #[test]
    fn remove_clears_the_slot() {
        let mut allocator = EntityAllocator::new();
        let mut store: SparseComponentStore<u32> = SparseComponentStore::new();
        let e = allocator.spawn();
        store.insert(e, 42);
        assert_eq!(store.remove(e), Some(42));
        assert_eq!(store.get(e), None);
    }
}
