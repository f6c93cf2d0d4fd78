//! Constants shared by the particle demos
//!
//! Values are in screen-aligned world units: x and y are pixels at the
//! reference resolution, z is depth in front of the camera.

use glam::Vec3;

/// Gravitational constant for the N-body demo (unit masses)
pub const G: f32 = 1000.0;

/// Softening length that keeps the 1/r² force finite at near-zero separation
pub const SOFTENING: f32 = 1.0e-2;

/// Near depth plane of the particle volume
pub const Z_NEAR: f32 = 200.0;

/// Far depth plane of the particle volume
pub const Z_FAR: f32 = 3200.0;

/// Simulation rate; every demo steps at a fixed 60 Hz
pub const FPS: f32 = 60.0;

/// Fixed time step
pub const FIXED_DT: f32 = 1.0 / FPS;

/// Bias added to the random spawn colour. Keeps the palette blue-ish.
pub const COLOR_BIAS: Vec3 = Vec3::new(1.0, 2.0, 3.0);

/// Peak speed of the starfield warp controller
pub const WARP_SPEED: f32 = 1000.0;

/// Offset of the warp speed oscillation; keeps the camera always moving forward
pub const WARP_BIAS: f32 = 1.2;

/// Spread of the random initial velocity in the N-body demo
pub const GRAVITY_SPAWN_SPEED: f32 = 50.0;
