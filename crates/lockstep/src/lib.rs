// =============================================================================
// LOCKSTEP - fixed-capacity simulation engine
// =============================================================================
//! The engine facade.
//!
//! [`world::World`] assembles the kernel pieces (time chain, flow graph,
//! registry, event hub) into a runnable three-phase frame pipeline;
//! [`components`] and [`states`] provide the reference world that the
//! soak binary and the integration tests run; [`backends`] provides
//! headless render and physics backends for tests and servers.
//!
//! Applications that want the raw kernel can reach through to
//! [`lockstep_core`] directly - everything there is re-exported here.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backends;
pub mod components;
pub mod states;
pub mod world;

pub use lockstep_core::*;
pub use lockstep_shared as shared;

pub use world::{DrawCall, GameContext, GameEvent, QuadSpec, World, WorldFrame, WorldStats};
