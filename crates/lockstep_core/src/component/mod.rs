// =============================================================================
// COMPONENT MODEL - fixed pools, entity table, phase-ordered registry
// =============================================================================
//! The pooled component model.
//!
//! Components are plain structs implementing [`Component`]. Each registered
//! component type gets a [`TypedPool`] of fixed capacity; entities are
//! rows in a fixed-capacity table owning handles into those pools. The
//! [`Registry`] drives every pool through the three frame phases in
//! priority order.
//!
//! Structural changes (acquire, release, entity teardown) are never applied
//! mid-frame. They are queued and resolved during Synchronise, so Core and
//! Render always see a stable world.

mod entity;
mod lifecycle;
mod pool;
mod registry;

pub use entity::{ComponentRef, Entity, EntityArena, EntityId};
pub use lifecycle::{Component, ComponentState};
pub use pool::{ComponentHandle, PoolCounts, TypedPool};
pub use registry::Registry;
