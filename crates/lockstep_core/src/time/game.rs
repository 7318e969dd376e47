//! The assembled time chain, sampled once per frame.

use super::clock::Clock;
use super::real::RealTime;
use super::scaled::ScaledTime;
use super::stepped::SteppedTime;
use super::{Ticks, TimeSource};

use lockstep_shared::DEFAULT_MAX_FRAME_STEP_US;

/// The real -> scaled -> stepped time chain.
///
/// Sampled exactly once per frame by [`GameTime::frame_started`], at the
/// top of Synchronise, so every hook in a frame sees one coherent set of
/// readings. Component hooks receive this by shared reference and never
/// advance it themselves.
pub struct GameTime {
    clock: Box<dyn Clock>,
    real: RealTime,
    scaled: ScaledTime,
    stepped: SteppedTime,
}

impl GameTime {
    /// A time chain over `clock` with the given fixed physics step, a
    /// scale of 1.0 and the default one-second frame clamp.
    #[must_use]
    pub fn new(clock: Box<dyn Clock>, step: Ticks) -> Self {
        GameTime {
            clock,
            real: RealTime::default(),
            scaled: ScaledTime::new(DEFAULT_MAX_FRAME_STEP_US),
            stepped: SteppedTime::new(step),
        }
    }

    /// Samples the clock and advances the whole chain.
    pub fn frame_started(&mut self) {
        let now = self.clock.now();
        self.real.sample(now);
        self.scaled.advance(self.real.frame_delta());
        self.stepped.advance(self.scaled.current_time());
    }

    /// Unscaled wall time.
    #[inline]
    #[must_use]
    pub fn real(&self) -> &RealTime {
        &self.real
    }

    /// The game clock. Per-frame simulation logic times itself off this.
    #[inline]
    #[must_use]
    pub fn game(&self) -> &ScaledTime {
        &self.scaled
    }

    /// The quantised physics clock.
    #[inline]
    #[must_use]
    pub fn physics(&self) -> &SteppedTime {
        &self.stepped
    }

    /// Physics steps to simulate this frame.
    #[inline]
    #[must_use]
    pub fn steps_this_frame(&self) -> u64 {
        self.stepped.steps_this_frame()
    }

    /// Fixed physics step length.
    #[inline]
    #[must_use]
    pub fn step(&self) -> Ticks {
        self.stepped.step()
    }

    /// Fixed physics step length in seconds.
    #[inline]
    #[must_use]
    pub fn step_seconds(&self) -> f32 {
        self.stepped.step_seconds()
    }

    /// Sets the game clock's scale. Zero pauses the simulation while the
    /// frame loop and renderer keep running.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.scaled.set_scale(scale);
    }

    /// Current game clock scale.
    #[inline]
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.scaled.scale()
    }

    /// Queues exactly one physics step's worth of game time for the next
    /// frame, regardless of scale. Single-step debugging while paused.
    pub fn step_next_frame(&mut self) {
        self.scaled.force_next_delta(self.stepped.step());
    }

    /// How far the game clock has run past the last completed physics
    /// step, as a fraction of a step in `[0, 1)`. Renderers use it to
    /// blend between the previous and current physics poses.
    #[must_use]
    pub fn interpolation_fraction(&self) -> f32 {
        let ahead = self.scaled.current_time() - self.stepped.current_time();
        ahead as f32 / self.stepped.step() as f32
    }
}
