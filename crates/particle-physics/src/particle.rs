//! Grid layout and spawn rules for the particle volume

use glam::{UVec2, UVec3, Vec2, Vec3};
use rand::distr::Open01;
use rand::Rng;

use crate::constants::COLOR_BIAS;

/// Geometry of the particle volume.
///
/// One particle lives in each `spacing`-sized cell of the box spanned by the
/// screen resolution in x/y and `[z_near, z_far)` in depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub resolution: UVec2,
    pub z_near: f32,
    pub z_far: f32,
    pub spacing: u32,
}

impl GridSpec {
    pub fn new(resolution: UVec2, z_near: f32, z_far: f32, spacing: u32) -> Self {
        assert!(spacing > 0, "grid spacing must be positive");
        assert!(
            0.0 < z_near && z_near < z_far,
            "depth range must satisfy 0 < z_near < z_far"
        );
        Self {
            resolution,
            z_near,
            z_far,
            spacing,
        }
    }

    /// Number of cells along each axis (integer division, partial cells dropped)
    pub fn dims(&self) -> UVec3 {
        let depth = (self.z_far - self.z_near) as u32;
        UVec3::new(
            self.resolution.x / self.spacing,
            self.resolution.y / self.spacing,
            depth / self.spacing,
        )
    }

    pub fn depth_range(&self) -> f32 {
        self.z_far - self.z_near
    }

    pub fn screen_size(&self) -> Vec2 {
        self.resolution.as_vec2()
    }

    /// True when `p` is strictly inside the screen rectangle and depth range
    pub fn contains(&self, p: Vec3) -> bool {
        let size = self.screen_size();
        0.0 < p.x && p.x < size.x && 0.0 < p.y && p.y < size.y && self.z_near < p.z && p.z < self.z_far
    }

    /// Pull a depth value into the open interval `(z_near, z_far)`
    pub fn clamp_depth(&self, z: f32) -> f32 {
        z.clamp(next_up(self.z_near), next_down(self.z_far))
    }
}

/// Margin kept between the in-cell jitter and the cell faces, so float
/// rounding of `(k + u) * spacing` never lands on a face.
const CELL_MARGIN: f32 = 1.0 / 4096.0;

/// How a freshly spawned particle's velocity is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityInit {
    /// At rest; motion comes from the shared warp velocity
    Zero,
    /// `(rand3() - 0.5) * scale`
    Signed { scale: f32 },
}

impl VelocityInit {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match *self {
            VelocityInit::Zero => Vec3::ZERO,
            VelocityInit::Signed { scale } => (rand3(rng) - 0.5) * scale,
        }
    }
}

/// State of one particle slot, as written by a spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub color: Vec3,
}

impl Particle {
    /// Draw a new particle for grid cell `index`
    pub fn spawn<R: Rng + ?Sized>(
        grid: &GridSpec,
        index: UVec3,
        velocity: VelocityInit,
        rng: &mut R,
    ) -> Self {
        let offset = rand3(rng).clamp(Vec3::splat(CELL_MARGIN), Vec3::splat(1.0 - CELL_MARGIN));
        let mut position = (index.as_vec3() + offset) * grid.spacing as f32;
        position.z += grid.z_near;

        let velocity = velocity.sample(rng);
        let color = rand3(rng) + COLOR_BIAS;

        Self {
            position,
            velocity,
            color,
        }
    }
}

/// Uniform sample from the open unit cube
pub fn rand3<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.sample(Open01), rng.sample(Open01), rng.sample(Open01))
}

// Only valid for finite positive values, which is all the depth planes use.
fn next_up(v: f32) -> f32 {
    f32::from_bits(v.to_bits() + 1)
}

fn next_down(v: f32) -> f32 {
    f32::from_bits(v.to_bits() - 1)
}
