//! Startup constants for the simulation kernel.
//!
//! These are defaults, not limits: `lockstep_core::config::KernelConfig`
//! can override each of them once, at startup. Nothing here changes at
//! runtime.

/// Default fixed physics tick rate in Hz.
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Default entity pool capacity.
///
/// The original target hardware comfortably ran a whole wave with 80
/// entities; anything larger is configuration, not growth.
pub const DEFAULT_ENTITY_CAPACITY: usize = 80;

/// Default clamp on a single scaled-time frame delta, in microseconds.
///
/// One full second: long enough to survive a debugger pause without the
/// physics clock exploding, short enough that the step loop stays bounded.
pub const DEFAULT_MAX_FRAME_STEP_US: u64 = 1_000_000;
