// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The broad-phase collision system: tracks a moved-shape set,
//! recomputes world AABBs from per-body transforms and per-shape local
//! offsets, and produces a deduplicated set of potentially overlapping
//! shape pairs each simulation step, backed by [`strata_tree`]'s dynamic
//! AABB tree and [`strata_ecs`]'s proxy-shape component column.
//!
//! ## Step order
//!
//! Within one simulation step, callers are expected to:
//!
//! 1. Call [`BroadPhase::update_proxy_shape`] (or
//!    [`BroadPhase::update_proxy_shapes`]) for every shape whose body
//!    moved or whose local offset changed. [`ProxyShapeView::set_local_to_body_transform`]
//!    does this for a single shape automatically.
//! 2. Call [`BroadPhase::compute_overlapping_pairs`] once, after every
//!    update for the step has been applied. It clears the moved-shape
//!    set on return.
//!
//! `add_proxy_collision_shape`/`remove_proxy_collision_shape` may be
//! interleaved with updates but must not run concurrently with a sweep
//! (see the crate's concurrency model — this subsystem assumes exclusive,
//! single-threaded access for the duration of one step).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod broad_phase;
mod config;
mod moved_set;
mod proxy_view;

pub use broad_phase::BroadPhase;
pub use config::{BroadPhaseConfig, TreeConfig};
pub use moved_set::MovedShapeSet;
pub use proxy_view::{BodyActivity, ProxyShapeView};

use strata_ecs::ProxyShapeRow;
use strata_math::Isometry;

/// Compose a proxy shape's world transform from its body's world
/// transform and its local-to-body offset: `T_world_shape = T_body *
/// local_to_body`.
///
/// Shared by [`BroadPhase`]'s AABB recomputation and [`ProxyShapeView`]'s
/// raycast/point/AABB accessors so both apply exactly the same
/// composition.
pub(crate) fn world_shape_transform(body_transform: Isometry, row: &ProxyShapeRow) -> Isometry {
    body_transform.compose(&row.local_to_body)
}
