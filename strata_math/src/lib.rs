// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar, AABB and rigid-transform primitives shared across the `strata`
//! broad-phase crates.
//!
//! This crate is deliberately small: it holds exactly the geometry the
//! dynamic tree, the entity/component store and the broad-phase system
//! need in common, so none of them have to depend on each other for
//! basic math.
//!
//! # Key types
//!
//! - [`Scalar`] — a numeric abstraction with a widened accumulator type
//!   (`f32` → `f64`), used for the surface-area-heuristic cost math in
//!   `strata_tree` so repeated additions of many leaf areas don't lose
//!   precision.
//! - [`Aabb3`] — a generic 3D axis-aligned bounding box over any
//!   [`Scalar`].
//! - [`Isometry`] — a rigid transform (rotation + translation), built on
//!   [`glam`]. Shapes and bodies in this subsystem never scale or shear,
//!   so a full 4x4 matrix is unnecessary.
//! - [`Ray`] — a ray (or bounded segment, via `max_fraction`) used by
//!   tree and broad-phase raycasts.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod aabb;
mod isometry;
mod ray;
mod scalar;

pub use aabb::Aabb3;
pub use isometry::Isometry;
pub use ray::Ray;
pub use scalar::{Scalar, ScalarAcc};

/// Re-exported vector and rotation types used by [`Isometry`] and by
/// collision shapes implemented against this crate.
pub mod glam {
    pub use glam::{Quat, Vec3};
}
