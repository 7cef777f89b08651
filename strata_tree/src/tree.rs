// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dynamic AABB tree itself.

use alloc::vec::Vec;
use core::fmt;

use strata_math::{glam::Vec3, Aabb3, Ray};

use crate::config::TreeConfig;
use crate::node::{Node, NodeId, NULL_NODE};

/// A self-balancing binary tree of AABBs with an arbitrary `Copy`
/// payload on each leaf.
///
/// See the crate docs for the overall algorithm. `P` is typically a
/// small handle (e.g. a proxy-shape row index), not the shape data
/// itself.
pub struct DynamicAabbTree<P> {
    nodes: Vec<Node<P>>,
    root: NodeId,
    free_list: NodeId,
    leaf_count: usize,
    config: TreeConfig,
}

impl<P: Copy> DynamicAabbTree<P> {
    /// Create an empty tree with the given configuration.
    pub fn new(config: TreeConfig) -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
            leaf_count: 0,
            config,
        }
    }

    /// The number of leaves currently in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Whether the tree holds no leaves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// The tree's tunable configuration.
    #[inline]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// The height of the subtree rooted at `node`, or `-1` if `node` is
    /// `NULL_NODE` or not currently allocated.
    pub fn height_of(&self, node: NodeId) -> i32 {
        if node == NULL_NODE {
            return -1;
        }
        self.nodes[node as usize].height
    }

    /// The current fat AABB of `node`.
    ///
    /// # Panics
    ///
    /// Panics (via a descriptive `debug_assert`) if `node` does not
    /// refer to a currently allocated node; this is a caller contract
    /// violation per the broad-phase's error-handling policy.
    pub fn get_fat_aabb(&self, node: NodeId) -> Aabb3<f32> {
        self.assert_live(node);
        self.nodes[node as usize].aabb
    }

    /// The payload stored at leaf `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a currently allocated leaf.
    pub fn get_payload(&self, node: NodeId) -> P {
        self.assert_live(node);
        self.nodes[node as usize]
            .payload
            .expect("get_payload called on an internal node, which has no payload")
    }

    fn assert_live(&self, node: NodeId) {
        debug_assert!(node != NULL_NODE, "node id must not be NULL_NODE");
        debug_assert!(
            (node as usize) < self.nodes.len() && !self.nodes[node as usize].is_free(),
            "node id does not refer to a currently allocated node"
        );
    }

    /// Insert a new leaf whose tight AABB is `aabb`, grown by the
    /// configured margin, using SAH descent. Returns the new leaf's
    /// node id.
    pub fn add_object(&mut self, aabb: Aabb3<f32>, payload: P) -> NodeId {
        let leaf = self.allocate_node();
        self.nodes[leaf as usize].aabb = aabb.expanded(self.config.fat_aabb_margin);
        self.nodes[leaf as usize].payload = Some(payload);
        self.nodes[leaf as usize].height = 0;
        self.insert_leaf(leaf);
        self.leaf_count += 1;
        leaf
    }

    /// Remove leaf `node` from the tree, collapsing and rebalancing its
    /// former ancestors.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a currently allocated leaf.
    pub fn remove_object(&mut self, node: NodeId) {
        self.assert_live(node);
        debug_assert!(
            self.nodes[node as usize].is_leaf(),
            "remove_object called with an internal node id"
        );
        self.remove_leaf(node);
        self.deallocate_node(node);
        self.leaf_count -= 1;
    }

    /// Update leaf `node`'s tight AABB.
    ///
    /// If `new_tight_aabb`, extrapolated along `displacement` times the
    /// configured prediction multiplier, is still contained in the
    /// leaf's current fat AABB, this is a no-op and returns `false`.
    /// Otherwise the leaf is removed, a new fat AABB is computed (margin
    /// plus displacement slack) and the leaf is reinserted; returns
    /// `true`.
    ///
    /// `displacement` should be the zero vector unless the embedding
    /// engine has opted into displacement-based prediction (see
    /// `BroadPhaseConfig::predict_displacement` in `strata_broadphase`);
    /// this tree does not gate the behavior itself, it just applies
    /// whatever displacement it is given.
    pub fn update_object(
        &mut self,
        node: NodeId,
        new_tight_aabb: Aabb3<f32>,
        displacement: Vec3,
    ) -> bool {
        self.assert_live(node);
        debug_assert!(
            self.nodes[node as usize].is_leaf(),
            "update_object called with an internal node id"
        );

        let fat_aabb = self.nodes[node as usize].aabb;
        if fat_aabb.contains_aabb(&new_tight_aabb) {
            return false;
        }

        self.remove_leaf(node);

        let mut new_fat = new_tight_aabb.expanded(self.config.fat_aabb_margin);
        let d = displacement * self.config.displacement_prediction;
        if d.x < 0.0 {
            new_fat.min[0] += d.x;
        } else {
            new_fat.max[0] += d.x;
        }
        if d.y < 0.0 {
            new_fat.min[1] += d.y;
        } else {
            new_fat.max[1] += d.y;
        }
        if d.z < 0.0 {
            new_fat.min[2] += d.z;
        } else {
            new_fat.max[2] += d.z;
        }
        self.nodes[node as usize].aabb = new_fat;

        self.insert_leaf(node);
        true
    }

    /// Invoke `callback(leaf)` for every leaf whose fat AABB overlaps
    /// `query`, pruning whole subtrees whose fat AABB does not.
    pub fn report_overlaps(&self, query: Aabb3<f32>, mut callback: impl FnMut(P)) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack: Vec<NodeId> = Vec::new();
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !node.aabb.overlaps(&query) {
                continue;
            }
            if node.is_leaf() {
                callback(node.payload.expect("leaf node must carry a payload"));
            } else {
                stack.push(node.children[0]);
                stack.push(node.children[1]);
            }
        }
    }

    /// Append the node id of every leaf whose fat AABB overlaps `query`
    /// to `out`, pruning whole subtrees whose fat AABB does not.
    ///
    /// Unlike [`Self::report_overlaps`], which hands the caller the
    /// leaf's payload, this returns the leaf's own node id — what the
    /// broad-phase's pair sweep needs to canonicalize `(min, max)` pairs
    /// before resolving payloads. `out` is not cleared first, so a
    /// caller sweeping many queries in a step can reuse one scratch
    /// buffer across all of them.
    pub fn report_overlapping_leaf_ids(&self, query: Aabb3<f32>, out: &mut Vec<NodeId>) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack: Vec<NodeId> = Vec::new();
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !node.aabb.overlaps(&query) {
                continue;
            }
            if node.is_leaf() {
                out.push(id);
            } else {
                stack.push(node.children[0]);
                stack.push(node.children[1]);
            }
        }
    }

    /// Translate every currently allocated node's fat AABB by `delta`,
    /// without touching tree topology.
    ///
    /// Intended for embedding engines with a floating-origin large-world
    /// scheme: rebasing the origin moves every body (and thus every
    /// proxy shape) by the same delta, so the tree's bounds can be kept
    /// in sync with a single linear pass instead of a remove/reinsert of
    /// every leaf.
    pub fn shift_origin(&mut self, delta: Vec3) {
        let d = [delta.x, delta.y, delta.z];
        for node in &mut self.nodes {
            if node.is_free() {
                continue;
            }
            for i in 0..3 {
                node.aabb.min[i] += d[i];
                node.aabb.max[i] += d[i];
            }
        }
    }

    /// Cast a ray through the tree, pruning on a slab test against fat
    /// AABBs.
    ///
    /// `callback(leaf_payload, ray)` is invoked for each candidate leaf
    /// whose fat AABB the ray passes through (in an order following the
    /// tree's pre-order pruning, not necessarily sorted by distance).
    /// Its return value controls traversal, matching the source
    /// semantics exactly: negative ignores this leaf and continues;
    /// zero stops the cast immediately; a value in `(0, 1]` shortens the
    /// ray's `max_fraction` to that value for all subsequent tests.
    pub fn raycast(&self, ray: Ray, mut callback: impl FnMut(P, &Ray) -> f32) {
        if self.root == NULL_NODE {
            return;
        }
        let mut local_ray = ray;
        let mut stack: Vec<NodeId> = Vec::new();
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !ray_intersects_fat_aabb(&local_ray, &node.aabb) {
                continue;
            }
            if node.is_leaf() {
                let fraction = callback(
                    node.payload.expect("leaf node must carry a payload"),
                    &local_ray,
                );
                if fraction == 0.0 {
                    return;
                }
                if fraction > 0.0 {
                    local_ray.max_fraction = local_ray.max_fraction.min(fraction);
                }
            } else {
                stack.push(node.children[0]);
                stack.push(node.children[1]);
            }
        }
    }

    /// Recursively check properties 1 (containment) and 2 (balance)
    /// across the whole tree; panics with a descriptive message on the
    /// first violation found. Intended for tests and debug audits, not
    /// production call sites.
    pub fn validate(&self) {
        if self.root != NULL_NODE {
            self.validate_node(self.root);
        }
    }

    fn validate_node(&self, id: NodeId) -> (Aabb3<f32>, i32) {
        let node = &self.nodes[id as usize];
        if node.is_leaf() {
            debug_assert_eq!(node.height, 0, "leaf height must be 0");
            return (node.aabb, 0);
        }
        let (left_aabb, left_height) = self.validate_node(node.children[0]);
        let (right_aabb, right_height) = self.validate_node(node.children[1]);
        let union = left_aabb.union(&right_aabb);
        assert!(
            node.aabb.contains_aabb(&union),
            "internal node {id} fat AABB does not contain the union of its children"
        );
        let balance = (left_height - right_height).abs();
        assert!(
            balance <= 1,
            "internal node {id} is unbalanced: |{left_height} - {right_height}| > 1"
        );
        let height = 1 + left_height.max(right_height);
        assert_eq!(
            node.height, height,
            "internal node {id} has a stale cached height"
        );
        (node.aabb, height)
    }

    fn allocate_node(&mut self) -> NodeId {
        if self.free_list == NULL_NODE {
            let old_capacity = self.nodes.len();
            let new_capacity = if old_capacity == 0 {
                self.config.initial_capacity.max(1)
            } else {
                old_capacity * 2
            };
            debug_assert!(
                new_capacity > old_capacity,
                "node arena growth must strictly increase capacity"
            );
            self.nodes.reserve(new_capacity - old_capacity);
            for i in old_capacity..new_capacity {
                let next_free = if i + 1 < new_capacity {
                    (i + 1) as NodeId
                } else {
                    NULL_NODE
                };
                self.nodes.push(Node::free(next_free));
            }
            self.free_list = old_capacity as NodeId;
        }

        let id = self.free_list;
        self.free_list = self.nodes[id as usize].parent;
        self.nodes[id as usize] = Node {
            aabb: Aabb3::new([0.0; 3], [0.0; 3]),
            parent: NULL_NODE,
            children: [NULL_NODE, NULL_NODE],
            height: 0,
            payload: None,
        };
        id
    }

    fn deallocate_node(&mut self, id: NodeId) {
        debug_assert!((id as usize) < self.nodes.len(), "node id out of range");
        self.nodes[id as usize] = Node::free(self.free_list);
        self.free_list = id;
    }

    fn insert_leaf(&mut self, leaf: NodeId) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].children[0];
            let child2 = self.nodes[index as usize].children[1];

            let area = self.nodes[index as usize].aabb.area();
            let combined_area = self.nodes[index as usize].aabb.union(&leaf_aabb).area();
            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost_of = |nodes: &Vec<Node<P>>, child: NodeId| -> f64 {
                let child_node = &nodes[child as usize];
                let new_area = child_node.aabb.union(&leaf_aabb).area();
                if child_node.is_leaf() {
                    new_area + inheritance_cost
                } else {
                    let old_area = child_node.aabb.area();
                    (new_area - old_area) + inheritance_cost
                }
            };
            let cost1 = cost_of(&self.nodes, child1);
            let cost2 = cost_of(&self.nodes, child2);

            if cost < cost1 && cost < cost2 {
                break;
            }

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].aabb = self.nodes[sibling as usize].aabb.union(&leaf_aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].children[0] == sibling {
                self.nodes[old_parent as usize].children[0] = new_parent;
            } else {
                self.nodes[old_parent as usize].children[1] = new_parent;
            }
        } else {
            self.root = new_parent;
        }
        self.nodes[new_parent as usize].children[0] = sibling;
        self.nodes[new_parent as usize].children[1] = leaf;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        // Walk back to the root, refitting AABBs/heights and rebalancing.
        let mut idx = self.nodes[leaf as usize].parent;
        while idx != NULL_NODE {
            idx = self.balance(idx);

            let child1 = self.nodes[idx as usize].children[0];
            let child2 = self.nodes[idx as usize].children[1];
            self.nodes[idx as usize].height =
                1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
            self.nodes[idx as usize].aabb =
                self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);

            idx = self.nodes[idx as usize].parent;
        }
    }

    fn remove_leaf(&mut self, leaf: NodeId) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].children[0] == leaf {
            self.nodes[parent as usize].children[1]
        } else {
            self.nodes[parent as usize].children[0]
        };

        if grand_parent != NULL_NODE {
            if self.nodes[grand_parent as usize].children[0] == parent {
                self.nodes[grand_parent as usize].children[0] = sibling;
            } else {
                self.nodes[grand_parent as usize].children[1] = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.deallocate_node(parent);

            let mut idx = grand_parent;
            while idx != NULL_NODE {
                idx = self.balance(idx);

                let child1 = self.nodes[idx as usize].children[0];
                let child2 = self.nodes[idx as usize].children[1];
                self.nodes[idx as usize].aabb =
                    self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);
                self.nodes[idx as usize].height =
                    1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);

                idx = self.nodes[idx as usize].parent;
            }
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.deallocate_node(parent);
        }
    }

    /// Single AVL rotation centered on `node_a`, if its children's
    /// heights differ by 2 or more. Returns the id of whatever node now
    /// occupies `node_a`'s former position (itself, if no rotation was
    /// needed).
    fn balance(&mut self, node_a: NodeId) -> NodeId {
        if self.nodes[node_a as usize].is_leaf() || self.nodes[node_a as usize].height < 2 {
            return node_a;
        }

        let node_b = self.nodes[node_a as usize].children[0];
        let node_c = self.nodes[node_a as usize].children[1];
        let balance = self.nodes[node_c as usize].height - self.nodes[node_b as usize].height;

        if balance > 1 {
            return self.rotate(node_a, node_c, node_b);
        }
        if balance < -1 {
            return self.rotate(node_a, node_b, node_c);
        }
        node_a
    }

    /// Rotate `taller` (currently a child of `a`) up to take `a`'s
    /// place; `shorter` is `a`'s other child. Shared by both directions
    /// of `balance`: the `balance > 1` case calls this with
    /// `(a, child2, child1)`, the `balance < -1` case with
    /// `(a, child1, child2)`.
    fn rotate(&mut self, a: NodeId, taller: NodeId, shorter: NodeId) -> NodeId {
        let f = self.nodes[taller as usize].children[0];
        let g = self.nodes[taller as usize].children[1];

        // Swap a and taller.
        self.nodes[taller as usize].children[0] = a;
        let old_parent = self.nodes[a as usize].parent;
        self.nodes[taller as usize].parent = old_parent;
        self.nodes[a as usize].parent = taller;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].children[0] == a {
                self.nodes[old_parent as usize].children[0] = taller;
            } else {
                self.nodes[old_parent as usize].children[1] = taller;
            }
        } else {
            self.root = taller;
        }

        if self.nodes[f as usize].height > self.nodes[g as usize].height {
            self.nodes[taller as usize].children[1] = f;
            self.nodes[a as usize].children[1] = g;
            self.nodes[g as usize].parent = a;
            self.nodes[a as usize].aabb = self.nodes[shorter as usize].aabb.union(&self.nodes[g as usize].aabb);
            self.nodes[taller as usize].aabb = self.nodes[a as usize].aabb.union(&self.nodes[f as usize].aabb);
            self.nodes[a as usize].height =
                1 + self.nodes[shorter as usize].height.max(self.nodes[g as usize].height);
            self.nodes[taller as usize].height =
                1 + self.nodes[a as usize].height.max(self.nodes[f as usize].height);
        } else {
            self.nodes[taller as usize].children[1] = g;
            self.nodes[a as usize].children[1] = f;
            self.nodes[f as usize].parent = a;
            self.nodes[a as usize].aabb = self.nodes[shorter as usize].aabb.union(&self.nodes[f as usize].aabb);
            self.nodes[taller as usize].aabb = self.nodes[a as usize].aabb.union(&self.nodes[g as usize].aabb);
            self.nodes[a as usize].height =
                1 + self.nodes[shorter as usize].height.max(self.nodes[f as usize].height);
            self.nodes[taller as usize].height =
                1 + self.nodes[a as usize].height.max(self.nodes[g as usize].height);
        }

        taller
    }
}

/// Ray/fat-AABB slab test. `ray.max_fraction` bounds the segment;
/// parallel-to-an-axis rays reject unless the origin already lies
/// within that axis's slab.
fn ray_intersects_fat_aabb(ray: &Ray, aabb: &Aabb3<f32>) -> bool {
    const EPSILON: f32 = 1e-8;

    let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
    let dir = [ray.direction.x, ray.direction.y, ray.direction.z];

    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = ray.max_fraction;

    for i in 0..3 {
        if dir[i].abs() < EPSILON {
            if origin[i] < aabb.min[i] || aabb.max[i] < origin[i] {
                return false;
            }
        } else {
            let inv_d = 1.0 / dir[i];
            let mut t1 = (aabb.min[i] - origin[i]) * inv_d;
            let mut t2 = (aabb.max[i] - origin[i]) * inv_d;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }
    }
    true
}

impl<P: Copy + fmt::Debug> fmt::Debug for DynamicAabbTree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAabbTree")
            .field("leaf_count", &self.leaf_count)
            .field("node_capacity", &self.nodes.len())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(center: [f32; 3], half: f32) -> Aabb3<f32> {
        Aabb3::new(
            [center[0] - half, center[1] - half, center[2] - half],
            [center[0] + half, center[1] + half, center[2] + half],
        )
    }

    #[test]
    fn insert_and_query_completeness() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let ids = [
            tree.add_object(cube([0.0, 0.0, 0.0], 0.5), 0),
            tree.add_object(cube([5.0, 0.0, 0.0], 0.5), 1),
            tree.add_object(cube([10.0, 0.0, 0.0], 0.5), 2),
        ];
        assert_eq!(tree.len(), 3);
        tree.validate();

        let mut hits = Vec::new();
        tree.report_overlaps(cube([0.0, 0.0, 0.0], 1.0), |p| hits.push(p));
        assert_eq!(hits, alloc::vec![0]);

        let _ = ids;
    }

    #[test]
    fn remove_collapses_parent_and_stays_balanced() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let mut ids = Vec::new();
        for i in 0..32 {
            let x = (i as f32) * 1.5;
            ids.push(tree.add_object(cube([x, 0.0, 0.0], 0.4), i));
            tree.validate();
        }
        for (i, id) in ids.into_iter().enumerate() {
            if i % 2 == 0 {
                tree.remove_object(id);
                tree.validate();
            }
        }
        assert_eq!(tree.len(), 16);
    }

    #[test]
    fn update_within_fat_aabb_is_a_no_op() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let id = tree.add_object(cube([0.0, 0.0, 0.0], 1.0), 0);
        let fat_before = tree.get_fat_aabb(id);

        let moved = tree.update_object(id, cube([0.02, 0.0, 0.0], 1.0), Vec3::ZERO);
        assert!(!moved);
        assert_eq!(tree.get_fat_aabb(id), fat_before);
    }

    #[test]
    fn update_escaping_fat_aabb_reinserts() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let id = tree.add_object(cube([0.0, 0.0, 0.0], 1.0), 0);

        let moved = tree.update_object(id, cube([5.0, 0.0, 0.0], 1.0), Vec3::ZERO);
        assert!(moved);
        let fat = tree.get_fat_aabb(id);
        assert!(fat.contains_point([5.0, 0.0, 0.0]));
    }

    #[test]
    fn raycast_shortening_skips_farther_leaves() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        tree.add_object(cube([0.0, 0.0, 0.0], 0.5), 0);
        tree.add_object(cube([3.0, 0.0, 0.0], 0.5), 1);
        tree.add_object(cube([6.0, 0.0, 0.0], 0.5), 2);

        let ray = Ray::segment(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let mut visited = Vec::new();
        tree.raycast(ray, |payload, r| {
            visited.push(payload);
            if payload == 0 {
                0.5
            } else {
                r.max_fraction
            }
        });

        // x=6 sits past the shortened fraction (ray spans -10..10, so the
        // x=0 hit at fraction 0.5 maps to world x=0, leaving nothing
        // beyond the midpoint reachable); only leaves 0 and 1 may be
        // visited, never 2.
        assert!(visited.contains(&0));
        assert!(!visited.contains(&2));
    }

    #[test]
    fn overlapping_leaf_ids_matches_report_overlaps() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let id0 = tree.add_object(cube([0.0, 0.0, 0.0], 0.5), 0);
        tree.add_object(cube([5.0, 0.0, 0.0], 0.5), 1);

        let mut ids = Vec::new();
        tree.report_overlapping_leaf_ids(cube([0.0, 0.0, 0.0], 1.0), &mut ids);
        assert_eq!(ids, alloc::vec![id0]);
    }

    #[test]
    fn shift_origin_translates_every_fat_aabb() {
        let mut tree: DynamicAabbTree<u32> = DynamicAabbTree::new(TreeConfig::default());
        let a = tree.add_object(cube([0.0, 0.0, 0.0], 0.5), 0);
        let b = tree.add_object(cube([5.0, 0.0, 0.0], 0.5), 1);
        let fat_a_before = tree.get_fat_aabb(a);
        let fat_b_before = tree.get_fat_aabb(b);

        let delta = Vec3::new(10.0, -2.0, 0.0);
        tree.shift_origin(delta);

        let fat_a_after = tree.get_fat_aabb(a);
        assert_eq!(fat_a_after.min, [fat_a_before.min[0] + 10.0, fat_a_before.min[1] - 2.0, fat_a_before.min[2]]);
        assert_eq!(fat_a_after.max, [fat_a_before.max[0] + 10.0, fat_a_before.max[1] - 2.0, fat_a_before.max[2]]);
        let fat_b_after = tree.get_fat_aabb(b);
        assert_eq!(fat_b_after.min[0], fat_b_before.min[0] + 10.0);
        tree.validate();
    }

    #[test]
    fn random_insert_remove_keeps_invariants() {
        let mut tree: DynamicAabbTree<usize> = DynamicAabbTree::new(TreeConfig::default());
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let mut ids = Vec::new();
        for i in 0..1000 {
            let x = (next() % 100) as f32;
            let y = (next() % 100) as f32;
            let z = (next() % 100) as f32;
            ids.push(tree.add_object(cube([x, y, z], 0.5), i));
        }
        tree.validate();

        for (i, id) in ids.into_iter().enumerate() {
            if i % 2 == 0 {
                tree.remove_object(id);
            }
        }
        assert_eq!(tree.len(), 500);
        tree.validate();

        let mut count = 0;
        tree.report_overlaps(Aabb3::new([-1000.0; 3], [1000.0; 3]), |_| count += 1);
        assert_eq!(count, 500);
    }
}
