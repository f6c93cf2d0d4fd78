//! Pairwise gravity for the N-body demo
//!
//! Brute force O(n²): every ordered pair contributes, recomputed in full
//! every tick. No tree or caching.

use glam::Vec3;
use rayon::prelude::*;

use crate::constants::{G, SOFTENING};

/// How the 1/r² singularity is regularised
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Softening {
    /// `G r / max(|r|, ε)³`
    #[default]
    Clamp,
    /// `G r / (|r|² + ε)^(3/2)`
    Plummer,
}

/// Gravity parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub strength: f32,
    pub epsilon: f32,
    pub softening: Softening,
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            strength: G,
            epsilon: SOFTENING,
            softening: Softening::Clamp,
        }
    }
}

impl Gravity {
    /// Force that the particle at `other` exerts on the particle at `this`
    pub fn pair_force(&self, this: Vec3, other: Vec3) -> Vec3 {
        let r = other - this;
        let dist = match self.softening {
            Softening::Clamp => r.length().max(self.epsilon),
            Softening::Plummer => (r.length_squared() + self.epsilon).sqrt(),
        };
        self.strength * r / (dist * dist * dist)
    }

    /// Net force on particle `i` from every other particle
    pub fn net_force(&self, positions: &[Vec3], i: usize) -> Vec3 {
        let this = positions[i];
        let mut force = Vec3::ZERO;
        for (j, &other) in positions.iter().enumerate() {
            if j != i {
                force += self.pair_force(this, other);
            }
        }
        force
    }

    /// Zero every accumulator, then sum all pair contributions into it.
    ///
    /// The zero pass finishes before any accumulation starts, so no force
    /// carries over between ticks.
    pub fn accumulate(&self, positions: &[Vec3], forces: &mut [Vec3]) {
        debug_assert_eq!(positions.len(), forces.len());

        forces.par_iter_mut().for_each(|f| *f = Vec3::ZERO);

        forces.par_iter_mut().enumerate().for_each(|(i, f)| {
            *f += self.net_force(positions, i);
        });
    }
}
