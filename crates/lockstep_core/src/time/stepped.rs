//! Fixed-tick quantisation of the game clock.

use super::{ticks_to_seconds, Ticks, TimeSource};

/// Game time quantised onto a fixed step.
///
/// The step count is always `floor(scaled_total / step)`, so the steps a
/// frame produces depend only on the accumulated scaled time, not on how
/// that time was divided into frames. `current_time` reports the
/// quantised total (`steps * step`), never the raw input.
#[derive(Debug)]
pub struct SteppedTime {
    step: Ticks,
    total_steps: u64,
    frame_steps: u64,
}

impl SteppedTime {
    /// A stepped clock with the given fixed tick length.
    #[must_use]
    pub fn new(step: Ticks) -> Self {
        assert!(step > 0, "step length must be non-zero");
        SteppedTime { step, total_steps: 0, frame_steps: 0 }
    }

    /// Requantises against the new accumulated game time.
    pub fn advance(&mut self, scaled_total: Ticks) {
        let total = scaled_total / self.step;
        debug_assert!(total >= self.total_steps, "game time went backwards");
        self.frame_steps = total - self.total_steps;
        self.total_steps = total;
    }

    /// Fixed tick length.
    #[inline]
    #[must_use]
    pub fn step(&self) -> Ticks {
        self.step
    }

    /// Fixed tick length in seconds, for physics integration.
    #[inline]
    #[must_use]
    pub fn step_seconds(&self) -> f32 {
        ticks_to_seconds(self.step)
    }

    /// Whole steps crossed at the last advance. Zero on fast frames,
    /// several after a slow one.
    #[inline]
    #[must_use]
    pub fn steps_this_frame(&self) -> u64 {
        self.frame_steps
    }

    /// Steps crossed since construction.
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

impl TimeSource for SteppedTime {
    fn current_time(&self) -> Ticks {
        self.total_steps * self.step
    }

    fn frame_delta(&self) -> Ticks {
        self.frame_steps * self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_frames_produce_zero_steps() {
        let mut stepped = SteppedTime::new(16_666);
        stepped.advance(10_000);
        assert_eq!(stepped.steps_this_frame(), 0);
        assert_eq!(stepped.current_time(), 0);

        stepped.advance(20_000);
        assert_eq!(stepped.steps_this_frame(), 1);
        assert_eq!(stepped.current_time(), 16_666);
    }

    #[test]
    fn slow_frame_produces_several_steps() {
        let mut stepped = SteppedTime::new(10_000);
        stepped.advance(35_000);
        assert_eq!(stepped.steps_this_frame(), 3);
        assert_eq!(stepped.current_time(), 30_000);
    }

    #[test]
    fn step_counts_depend_only_on_totals() {
        // The same accumulated time, sliced two different ways, yields
        // the same total step count.
        let step = 16_666;
        let slices_a = [3_000, 30_000, 200, 50_132];
        let slices_b = [41_666, 41_666];
        let total: Ticks = slices_a.iter().sum();
        assert_eq!(total, slices_b.iter().sum::<Ticks>());

        let run = |slices: &[Ticks]| {
            let mut stepped = SteppedTime::new(step);
            let mut acc = 0;
            let mut steps = 0;
            for &s in slices {
                acc += s;
                stepped.advance(acc);
                steps += stepped.steps_this_frame();
            }
            steps
        };
        assert_eq!(run(&slices_a), run(&slices_b));
        assert_eq!(run(&slices_a), total / step);
    }
}
