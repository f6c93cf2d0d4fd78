//! # Particle Simulation
//!
//! Demo selection, parameters and the per-frame `tick(dt)` driver that ties
//! the physics steppers to the software renderer.

pub mod params;
pub mod simulation;

pub use params::*;
pub use simulation::*;
