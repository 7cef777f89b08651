// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational entity ids and the columnar component stores the
//! broad-phase reads and writes: a body's world transform (and, when
//! displacement prediction is enabled, its linear velocity), and the
//! dense, enabled/disabled-partitioned proxy-shape column.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod component_store;
mod entity;
mod proxy_shape;
mod shape;
mod transform;

pub use component_store::SparseComponentStore;
pub use entity::{Entity, EntityAllocator};
pub use proxy_shape::{ProxyShapeComponents, ProxyShapeRow};
pub use shape::{CollisionShape, RaycastHit, ShapeHandle};
pub use transform::{TransformComponents, VelocityComponents};
