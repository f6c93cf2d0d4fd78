//! # Particle Physics
//!
//! Particle storage, spawning and per-tick motion for the starfield and
//! N-body demos. Everything runs on the CPU; per-particle loops are
//! data-parallel through rayon.

pub mod constants;
pub mod field;
pub mod forces;
pub mod particle;
pub mod rng;
pub mod stepper;

pub use constants::*;
pub use field::*;
pub use forces::*;
pub use particle::*;
pub use rng::*;
pub use stepper::*;
