// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the uniform draws that decide crashes and completions.
pub trait ChanceSource: Send {
    /// Next value in `[0, 1)`.
    fn draw(&mut self) -> f32;
}

/// `StdRng` backed source. Seeded runs are reproducible.
#[derive(Debug)]
pub struct SeededChance {
    rng: StdRng,
}

impl SeededChance {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl ChanceSource for SeededChance {
    fn draw(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Replays a fixed sequence of draws, starting over at the end.
#[derive(Debug, Clone)]
pub struct ScriptedChance {
    draws: Vec<f32>,
    position: usize,
}

impl ScriptedChance {
    pub fn new(draws: Vec<f32>) -> Self {
        assert!(!draws.is_empty(), "a scripted chance needs at least one draw");
        Self { draws, position: 0 }
    }

    /// Always returns the same value.
    pub fn constant(draw: f32) -> Self {
        Self::new(vec![draw])
    }
}

impl ChanceSource for ScriptedChance {
    fn draw(&mut self) -> f32 {
        let draw = self.draws[self.position];
        self.position = (self.position + 1) % self.draws.len();
        draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_draws_repeat_and_stay_in_range() {
        let mut a = SeededChance::new(Some(7));
        let mut b = SeededChance::new(Some(7));
        for _ in 0..100 {
            let draw = a.draw();
            assert_eq!(draw, b.draw());
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_scripted_wraps_around() {
        let mut chance = ScriptedChance::new(vec![0.1, 0.9]);
        let draws: Vec<f32> = (0..5).map(|_| chance.draw()).collect();
        assert_eq!(draws, vec![0.1, 0.9, 0.1, 0.9, 0.1]);
    }
}
