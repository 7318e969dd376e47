// =============================================================================
// LOCKSTEP CORE - Pooled entities, flow graph, lock-step frame protocol
// =============================================================================
//! The simulation kernel.
//!
//! Everything in here is built around one rule: **all capacity is claimed
//! up front**. Component pools, the entity table and the flow graph are
//! sized at startup and never grow. Running out of a pool is a programming
//! error and panics; it is never handled at runtime.
//!
//! The second rule is the frame protocol. A frame is three phases:
//!
//! 1. **Core** - simulation logic and physics stepping
//! 2. **Synchronise** - the only phase allowed to write render-visible data
//! 3. **Render** - read-only over render-visible data
//!
//! Under the threaded scheduler, Core for frame N+1 overlaps Render for
//! frame N. The render thread only ever holds the committed frame
//! ([`sync::RenderFrame`]), never the simulation state; Synchronise is
//! the hand-off point between the two, enforced by a two-semaphore baton
//! in [`sync`].
//!
//! # Module map
//!
//! - [`component`] - pools, the entity table and the [`component::Registry`]
//! - [`flow`] - coarse application states wired by labelled exits
//! - [`time`] - the real / scaled / stepped time chain
//! - [`events`] - frame-synchronous game and contact event dispatch
//! - [`sync`] - semaphores and the threaded/single-threaded schedulers
//! - [`config`] - startup configuration loading
//! - [`backend`] - render and physics backend seams

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod component;
pub mod config;
pub mod events;
pub mod flow;
pub mod sync;
pub mod time;

pub use backend::{CollisionFilter, PhysicsBackend, RenderBackend};
pub use component::{
    Component, ComponentHandle, ComponentState, Entity, EntityId, PoolCounts, Registry,
};
pub use config::{ConfigError, KernelConfig};
pub use events::{ContactEvent, ContactKind, EventHub, EventTag, SubscriptionId};
pub use flow::{ExitRequest, FlowGraph, FlowState, NodeId};
pub use sync::{Phases, RenderFrame, Scheduler, Semaphore};
pub use time::{GameTime, ManualClock, SystemClock, Ticks, TimeSource};
