// =============================================================================
// SYNC - the frame baton between simulation and render
// =============================================================================
//! Frame scheduling and the simulation/render hand-off.
//!
//! The threaded scheduler pipelines the frame: while the render thread
//! draws frame N, the simulation thread runs Core for frame N+1. The
//! simulation half ([`Phases`]) never leaves the simulation thread; the
//! render half ([`RenderFrame`]) is handed between the threads by a pair
//! of semaphores, so at most one thread holds it at a time. [`Scheduler`]
//! documents the baton protocol.

mod scheduler;
mod semaphore;

pub use scheduler::{Phases, RenderFrame, Scheduler};
pub use semaphore::Semaphore;
