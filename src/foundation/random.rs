use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::foundation::xyz::Xyz;

/// Seeded random stream shared by tree construction, mutation and noise table setup.
///
/// A fixed seed reproduces the same trees, which keeps saved pictures and tests stable.
#[derive(Clone, Debug)]
pub struct Random01 {
    rng: Pcg32,
}

impl Random01 {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn r01(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Negative-exponential sample with mean 1.
    pub fn negexp(&mut self) -> f64 {
        -(1.0 - self.r01()).ln()
    }

    /// Negative-exponential magnitude with a random sign.
    pub fn signed_negexp(&mut self) -> f64 {
        if self.r01() < 0.5 {
            -self.negexp()
        } else {
            self.negexp()
        }
    }

    /// Uniform index in `0..n`; `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    pub fn shuffle<T>(&mut self, v: &mut [T]) {
        v.shuffle(&mut self.rng);
    }

    /// Uniformly distributed point on the unit sphere.
    pub fn sphere_normal(&mut self) -> Xyz {
        loop {
            let p = Xyz::new(
                2.0 * self.r01() - 1.0,
                2.0 * self.r01() - 1.0,
                2.0 * self.r01() - 1.0,
            );
            let m2 = p.magnitude2();
            if m2 > 1e-12 && m2 <= 1.0 {
                return p / m2.sqrt();
            }
        }
    }
}
