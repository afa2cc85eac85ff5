// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::Duration;

/// Fixed-step accumulator. Wall-clock time goes in, whole ticks come out and
/// the remainder stays in the lag for the next call.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    lag: Duration,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        assert!(!step.is_zero(), "the tick interval must not be zero");
        Self {
            step,
            lag: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn lag(&self) -> Duration {
        self.lag
    }

    /// Adds `elapsed` to the lag and drains it in whole steps.
    pub fn advance(&mut self, elapsed: Duration) -> u64 {
        self.lag += elapsed;
        let mut ticks = 0;
        while self.lag >= self.step {
            self.lag -= self.step;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::FixedStep;
    use std::time::Duration;

    #[test]
    fn test_lag_carries_over() {
        let mut clock = FixedStep::new(Duration::from_millis(100));
        assert_eq!(clock.advance(Duration::from_millis(40)), 0);
        assert_eq!(clock.advance(Duration::from_millis(70)), 1);
        assert_eq!(clock.lag(), Duration::from_millis(10));
        assert_eq!(clock.advance(Duration::from_millis(290)), 3);
        assert_eq!(clock.lag(), Duration::ZERO);
    }
}
