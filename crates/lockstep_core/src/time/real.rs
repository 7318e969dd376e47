//! Unscaled frame time, straight off the clock.

use super::{Ticks, TimeSource};

/// Frame-sampled real time.
///
/// The first sample establishes the origin and reports a zero delta, so
/// a long startup (asset loads, shader compiles) never turns into a huge
/// first-frame step downstream.
#[derive(Debug, Default)]
pub struct RealTime {
    current: Ticks,
    delta: Ticks,
    primed: bool,
}

impl RealTime {
    /// Records the clock reading for this frame.
    pub fn sample(&mut self, now: Ticks) {
        self.delta = if self.primed { now.saturating_sub(self.current) } else { 0 };
        self.current = now;
        self.primed = true;
    }
}

impl TimeSource for RealTime {
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
    fn first_sample_has_zero_delta() {
        let mut real = RealTime::default();
        real.sample(5_000_000);
        assert_eq!(real.current_time(), 5_000_000);
        assert_eq!(real.frame_delta(), 0);

        real.sample(5_016_000);
        assert_eq!(real.frame_delta(), 16_000);
    }

    #[test]
    fn backwards_clock_clamps_to_zero_delta() {
        let mut real = RealTime::default();
        real.sample(100);
        real.sample(200);
        real.sample(150);
        assert_eq!(real.frame_delta(), 0);
    }
}
