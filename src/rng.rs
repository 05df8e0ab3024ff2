//! Random sources used by every probabilistic decision of the engine.
//!
//! Nothing in the engine touches ambient randomness: accuracy, critical hits,
//! damage variance, status counters, capture shakes and escape rolls all go
//! through a [`RandomSource`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

pub trait RandomSource {
    /// Uniform integer in `min..max_exclusive`. Returns `min` for an empty range.
    fn uniform_int(&mut self, min: i32, max_exclusive: i32) -> i32;

    /// Uniform float in `min..max`. Returns `min` for an empty range.
    fn uniform_float(&mut self, min: f32, max: f32) -> f32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        (**self).uniform_int(min, max_exclusive)
    }

    fn uniform_float(&mut self, min: f32, max: f32) -> f32 {
        (**self).uniform_float(min, max)
    }
}

/// Seedable generator backed by `SmallRng`.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        if max_exclusive <= min {
            return min;
        }
        self.rng.gen_range(min..max_exclusive)
    }

    fn uniform_float(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Replays queued values, for tests that need to force a specific roll.
///
/// Queued values are clamped into the requested range so a script can never
/// produce an out-of-range roll. Once a queue runs dry the source answers the
/// lower bound of the range.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    ints: VecDeque<i32>,
    floats: VecDeque<f32>,
    int_calls: usize,
    float_calls: usize,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ints(ints: impl IntoIterator<Item = i32>) -> Self {
        let mut source = Self::new();
        source.push_ints(ints);
        source
    }

    pub fn push_ints(&mut self, ints: impl IntoIterator<Item = i32>) -> &mut Self {
        self.ints.extend(ints);
        self
    }

    pub fn push_floats(&mut self, floats: impl IntoIterator<Item = f32>) -> &mut Self {
        self.floats.extend(floats);
        self
    }

    pub fn remaining_ints(&self) -> usize {
        self.ints.len()
    }

    pub fn remaining_floats(&self) -> usize {
        self.floats.len()
    }

    /// Total number of rolls consumed so far (integer + float).
    pub fn calls(&self) -> usize {
        self.int_calls + self.float_calls
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        self.int_calls += 1;
        let upper = (max_exclusive - 1).max(min);
        match self.ints.pop_front() {
            Some(value) => value.clamp(min, upper),
            None => min,
        }
    }

    fn uniform_float(&mut self, min: f32, max: f32) -> f32 {
        self.float_calls += 1;
        let upper = max.max(min);
        match self.floats.pop_front() {
            Some(value) => value.clamp(min, upper),
            None => min,
        }
    }
}
