// =============================================================================
// TIME - real -> scaled -> stepped
// =============================================================================
//! The frame time chain.
//!
//! All kernel time is integer microseconds ([`Ticks`]); floating point
//! only appears at the edges, when a hook asks for seconds. Integer ticks
//! make the stepped quantisation exact: step counts depend only on the
//! accumulated scaled time, never on how it was sliced into frames.
//!
//! The chain is sampled once per frame, at the top of Synchronise:
//!
//! ```text
//! clock -> RealTime -> ScaledTime -> SteppedTime
//! ```
//!
//! [`ScaledTime`] is the game clock (pausable, scalable, clamped);
//! [`SteppedTime`] quantises it onto the fixed physics tick. The gap
//! between the two is the render interpolation fraction.

mod clock;
mod game;
mod real;
mod scaled;
mod stepped;

pub use clock::{Clock, ManualClock, SystemClock};
pub use game::GameTime;
pub use real::RealTime;
pub use scaled::ScaledTime;
pub use stepped::SteppedTime;

/// Kernel time unit: microseconds.
pub type Ticks = u64;

/// Ticks in one second.
pub const TICKS_PER_SECOND: Ticks = 1_000_000;

/// Converts a tick count to seconds, for hook-facing arithmetic.
#[inline]
#[must_use]
pub fn ticks_to_seconds(ticks: Ticks) -> f32 {
    ticks as f32 / TICKS_PER_SECOND as f32
}

/// One frame-sampled view of a clock: an accumulated total and the
/// delta since the previous sample.
pub trait TimeSource {
    /// Accumulated time at the last sample.
    fn current_time(&self) -> Ticks;

    /// Advance observed at the last sample.
    fn frame_delta(&self) -> Ticks;

    /// [`TimeSource::frame_delta`] in seconds.
    #[inline]
    fn frame_delta_seconds(&self) -> f32 {
        ticks_to_seconds(self.frame_delta())
    }

    /// [`TimeSource::current_time`] in seconds.
    #[inline]
    fn current_seconds(&self) -> f32 {
        ticks_to_seconds(self.current_time())
    }
}
