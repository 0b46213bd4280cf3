//! Injectable randomness for combat rolls
//!
//! Ricochet, bleeding, and fracture rolls all draw from a `CombatRng` so
//! damage computation stays deterministic under test. The rolls run
//! server-side only; clients never see or influence the source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of Bernoulli rolls for combat outcomes
pub trait CombatRng: Send + Sync {
    /// Roll once with the given success probability
    fn chance(&mut self, probability: f32) -> bool;
}

/// Default source backed by the thread-local generator
#[derive(Debug, Default)]
pub struct ThreadRngSource;

impl ThreadRngSource {
    pub fn new() -> Self {
        Self
    }
}

impl CombatRng for ThreadRngSource {
    fn chance(&mut self, probability: f32) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        rand::rng().random_bool(probability as f64)
    }
}

/// Deterministic source for reproducible test scenarios
#[derive(Debug)]
pub struct SeededRng(StdRng);

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl CombatRng for SeededRng {
    fn chance(&mut self, probability: f32) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.0.random_bool(probability as f64)
    }
}

/// Source that always returns the same outcome; pins down individual
/// branches in tests
#[derive(Debug, Clone, Copy)]
pub struct FixedRng(pub bool);

impl CombatRng for FixedRng {
    fn chance(&mut self, probability: f32) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.0
    }
}
