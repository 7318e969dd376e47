//! The game clock: pausable, scalable, clamped.

use super::{Ticks, TimeSource};

/// Scaled game time derived from real frame deltas.
///
/// Each frame the real delta is multiplied by the time scale and clamped
/// to `max_frame_step`, so a debugger pause or a long hitch arrives in
/// the simulation as one bounded step instead of a catch-up avalanche.
/// A scale of zero pauses the game clock entirely.
#[derive(Debug)]
pub struct ScaledTime {
    current: Ticks,
    delta: Ticks,
    scale: f32,
    max_frame_step: Ticks,
    forced_delta: Option<Ticks>,
}

impl ScaledTime {
    /// A game clock at scale 1.0 with the given per-frame clamp.
    #[must_use]
    pub fn new(max_frame_step: Ticks) -> Self {
        assert!(max_frame_step > 0, "max frame step must be non-zero");
        ScaledTime { current: 0, delta: 0, scale: 1.0, max_frame_step, forced_delta: None }
    }

    /// Advances by the scaled, clamped real delta, or by the pending
    /// forced delta if one was queued.
    pub fn advance(&mut self, real_delta: Ticks) {
        self.delta = match self.forced_delta.take() {
            Some(forced) => forced,
            None => {
                let scaled = (real_delta as f64 * f64::from(self.scale)) as Ticks;
                scaled.min(self.max_frame_step)
            }
        };
        self.current += self.delta;
    }

    /// Sets the time scale. Zero pauses, values above one fast-forward.
    pub fn set_scale(&mut self, scale: f32) {
        assert!(scale >= 0.0 && scale.is_finite(), "time scale must be finite and non-negative");
        self.scale = scale;
    }

    /// Current time scale.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Forces the next frame to advance by exactly `delta`, regardless of
    /// real time or scale. One-shot; used for single-stepping while
    /// paused.
    pub fn force_next_delta(&mut self, delta: Ticks) {
        self.forced_delta = Some(delta);
    }
}

impl TimeSource for ScaledTime {
    fn current_time(&self) -> Ticks {
        self.current
    }

    fn frame_delta(&self) -> Ticks {
        self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_applies_to_deltas() {
        let mut scaled = ScaledTime::new(1_000_000);
        scaled.set_scale(0.5);
        scaled.advance(10_000);
        assert_eq!(scaled.frame_delta(), 5_000);
        assert_eq!(scaled.current_time(), 5_000);
    }

    #[test]
    fn zero_scale_pauses() {
        let mut scaled = ScaledTime::new(1_000_000);
        scaled.set_scale(0.0);
        scaled.advance(16_000);
        scaled.advance(16_000);
        assert_eq!(scaled.current_time(), 0);
    }

    #[test]
    fn long_hitch_clamps_to_max_step() {
        let mut scaled = ScaledTime::new(1_000_000);
        // Five seconds at the debugger.
        scaled.advance(5_000_000);
        assert_eq!(scaled.frame_delta(), 1_000_000);
    }

    #[test]
    fn forced_delta_overrides_once() {
        let mut scaled = ScaledTime::new(1_000_000);
        scaled.set_scale(0.0);
        scaled.force_next_delta(16_666);
        scaled.advance(999);
        assert_eq!(scaled.frame_delta(), 16_666);
        scaled.advance(999);
        assert_eq!(scaled.frame_delta(), 0, "forced delta is one-shot");
    }
}
