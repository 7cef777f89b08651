// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree node storage.

use strata_math::Aabb3;

/// Index into the tree's node arena. `-1` (`NULL_NODE`) means "none".
///
/// Plain integer indices, not a generational handle: the tree itself
/// never hands out a stale id to a caller (the caller is the one who
/// holds on to the id returned by `add_object`, for exactly as long as
/// the object is indexed), so there is nothing for a generation counter
/// to protect against here. Compare this to `strata_ecs::Entity`, which
/// *is* generational because entity handles do outlive their rows.
pub type NodeId = i32;

/// Sentinel for "no node".
pub const NULL_NODE: NodeId = -1;

/// A single slot in the tree's node arena.
///
/// Internal and leaf nodes share this representation. `height == -1`
/// marks a slot that is currently on the free list rather than holding
/// a live node; in that state `parent` doubles as the intrusive
/// "next free slot" link, per the spec's space-optimization note.
#[derive(Clone, Debug)]
pub struct Node<P> {
    /// Fat AABB: for a leaf, its tight AABB grown by the margin (plus
    /// displacement slack); for an internal node, the union of its
    /// children's fat AABBs.
    pub aabb: Aabb3<f32>,
    /// Parent node id, or `NULL_NODE` at the root. Reused as the
    /// "next free" link when this slot is free (`height == -1`).
    pub parent: NodeId,
    /// Child node ids; both `NULL_NODE` for a leaf.
    pub children: [NodeId; 2],
    /// Subtree height: `0` for a leaf, `-1` when the slot is free.
    pub height: i32,
    /// Leaf payload. `None` for internal nodes and free slots.
    pub payload: Option<P>,
}

impl<P> Node<P> {
    pub(crate) fn free(next_free: NodeId) -> Self {
        Self {
            aabb: Aabb3::new([0.0; 3], [0.0; 3]),
            parent: next_free,
            children: [NULL_NODE, NULL_NODE],
            height: -1,
            payload: None,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children[0] == NULL_NODE
    }

    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        self.height == -1
    }
}
