//! Per-frame painting of a particle field into a [`PixelBuffer`]
//!
//! A frame is: fade the previous image, turn every particle into a
//! [`Sprite`] (projected endpoints, radius, colour), then rasterize the
//! sprites. Sprite preparation is parallel over particles; rasterization is
//! parallel over horizontal row bands, each band drawing the sprites that
//! overlap it in particle order.

use glam::{Vec2, Vec3};
use particle_physics::{GridSpec, ParticleField};
use rayon::prelude::*;

use crate::buffer::{Canvas, PixelBuffer};
use crate::camera::Projector;
use crate::raster::{self, Blend};

/// Rows per rasterization band
pub const BAND_ROWS: u32 = 16;

/// Screen-space draw command for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub current: Vec2,
    pub previous: Vec2,
    pub radius: f32,
    pub color: Vec3,
}

impl Sprite {
    fn is_finite(&self) -> bool {
        self.current.is_finite() && self.previous.is_finite() && self.radius.is_finite() && self.color.is_finite()
    }

    /// Image rows this sprite can touch, matching the primitives' boxes
    fn rows(&self, shape: SpriteShape) -> (i32, i32) {
        let pad = self.radius + 1.0;
        let (lo, hi) = match shape {
            SpriteShape::Star => (self.current.y, self.current.y),
            SpriteShape::Streak | SpriteShape::Trail => (
                self.current.y.min(self.previous.y),
                self.current.y.max(self.previous.y),
            ),
        };
        ((lo - pad) as i32, (hi + pad) as i32)
    }

    fn draw(&self, canvas: &mut Canvas, shape: SpriteShape) {
        match shape {
            SpriteShape::Star => raster::star(canvas, self.current, self.radius, self.color),
            SpriteShape::Streak => {
                raster::capsule(canvas, self.current, self.previous, self.radius, self.color, Blend::Overwrite)
            }
            SpriteShape::Trail => raster::capsule(
                canvas,
                self.current,
                self.previous,
                self.radius,
                self.color,
                Blend::AdditiveFalloff,
            ),
        }
    }
}

/// Primitive used for each sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteShape {
    /// Five-pointed star at the current position
    Star,
    /// Hard-edged capsule from current to previous position
    Streak,
    /// Additive capsule with quadratic falloff from current to previous position
    Trail,
}

/// How radius and colour follow from depth and distance to the screen centre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Large close-up stars, gently dimmed toward the edges
    Starfield,
    /// Thin trails, strongly dimmed toward the edges
    Gravity,
}

impl Shading {
    /// Radius and colour of a particle at world `position` with base `color`
    pub fn shade(&self, grid: &GridSpec, position: Vec3, color: Vec3) -> (f32, Vec3) {
        let k = 1.0 - position.z / grid.z_far;
        let size = grid.screen_size();
        let rel = position.truncate() / size - 0.5;
        let s = rel.length_squared();

        match self {
            Shading::Starfield => {
                let d = s.powf(0.2);
                (10.0 * k * k, color * (k + 0.1).sqrt() * (1.0 - d))
            }
            Shading::Gravity => {
                let fade = k.sqrt();
                (5.0 * fade, color * fade * (1.0 - (2.0 * s).powf(0.2)))
            }
        }
    }
}

/// Source of the velocity used for the previous-tick position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// One velocity for every particle (the starfield warp)
    Shared(Vec3),
    /// Each particle's own velocity
    PerParticle,
}

/// Paints a particle field frame by frame
pub struct Compositor {
    projector: Projector,
    shading: Shading,
    shape: SpriteShape,
    decay: f32,
    sprites: Vec<Sprite>,
}

impl Compositor {
    pub fn new(projector: Projector, shading: Shading, shape: SpriteShape, decay: f32) -> Self {
        log::debug!(
            "Compositor: {:?} shading, {:?} sprites, decay {}",
            shading,
            shape,
            decay
        );
        Self {
            projector,
            shading,
            shape,
            decay,
            sprites: Vec::new(),
        }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn shape(&self) -> SpriteShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: SpriteShape) {
        self.shape = shape;
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Sprites drawn by the last [`Compositor::paint`]
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Turn every particle into a sprite, in particle order.
    ///
    /// Sprites with a non-finite projection (a particle pushed behind the
    /// camera by a huge velocity) are dropped.
    pub fn prepare(&mut self, field: &ParticleField, motion: Motion, dt: f32) {
        let grid = *field.grid();
        let projector = self.projector;
        let shading = self.shading;

        self.sprites.clear();
        self.sprites.par_extend(
            field
                .positions()
                .par_iter()
                .zip(field.velocities().par_iter())
                .zip(field.colors().par_iter())
                .filter_map(move |((&position, &velocity), &color)| {
                    let velocity = match motion {
                        Motion::Shared(v) => v,
                        Motion::PerParticle => velocity,
                    };
                    let (radius, color) = shading.shade(&grid, position, color);
                    let sprite = Sprite {
                        current: projector.project(position),
                        previous: projector.project(position - velocity * dt),
                        radius,
                        color,
                    };
                    sprite.is_finite().then_some(sprite)
                }),
        );
    }

    /// Rasterize the prepared sprites into `buffer`, band by band
    pub fn rasterize(&self, buffer: &mut PixelBuffer) {
        let shape = self.shape;
        let sprites = &self.sprites;

        buffer.par_bands(BAND_ROWS).for_each(|mut canvas| {
            let rows = canvas.rows();
            for sprite in sprites {
                let (lo, hi) = sprite.rows(shape);
                if hi < rows.start || lo >= rows.end {
                    continue;
                }
                sprite.draw(&mut canvas, shape);
            }
        });
    }

    /// Full frame: decay, prepare, rasterize
    pub fn paint(&mut self, buffer: &mut PixelBuffer, field: &ParticleField, motion: Motion, dt: f32) {
        buffer.decay(self.decay);
        self.prepare(field, motion, dt);
        self.rasterize(buffer);
        log::trace!("painted {} of {} particles", self.sprites.len(), field.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::AspectScale;
    use glam::UVec2;
    use particle_physics::VelocityInit;

    fn starfield_grid() -> GridSpec {
        GridSpec::new(UVec2::new(320, 240), 200.0, 3200.0, 40)
    }

    fn starfield_compositor(shape: SpriteShape) -> Compositor {
        let projector = Projector::new(UVec2::new(320, 240), 120.0, AspectScale::Height);
        Compositor::new(projector, Shading::Starfield, shape, 0.8)
    }

    #[test]
    fn test_starfield_shading_matches_formula() {
        let grid = GridSpec::new(UVec2::new(1920, 1080), 200.0, 3200.0, 120);
        let (radius, color) = Shading::Starfield.shade(&grid, Vec3::new(960.0, 540.0, 1600.0), Vec3::ONE);

        assert!((radius - 2.5).abs() < 1e-5);
        // centred, so no radial dimming
        assert!((color - Vec3::splat(0.6f32.sqrt())).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_gravity_shading_fades_toward_edges() {
        let grid = GridSpec::new(UVec2::new(1920, 1280), 200.0, 3200.0, 100);
        let (radius, centre) = Shading::Gravity.shade(&grid, Vec3::new(960.0, 640.0, 800.0), Vec3::ONE);
        let (_, edge) = Shading::Gravity.shade(&grid, Vec3::new(100.0, 640.0, 800.0), Vec3::ONE);

        assert!((radius - 5.0 * 0.75f32.sqrt()).abs() < 1e-5);
        assert!((centre - Vec3::splat(0.75f32.sqrt())).abs().max_element() < 1e-5);
        assert!(edge.x < centre.x);
    }

    #[test]
    fn test_shared_motion_sets_previous_position() {
        let mut field = ParticleField::new(starfield_grid());
        field.spawn_all(VelocityInit::Zero, 5, 0);
        let mut compositor = starfield_compositor(SpriteShape::Star);

        let warp = Vec3::new(0.0, 0.0, -600.0);
        let dt = 1.0 / 60.0;
        compositor.prepare(&field, Motion::Shared(warp), dt);

        assert_eq!(compositor.sprites().len(), field.len());
        let p = field.positions()[0];
        let sprite = compositor.sprites()[0];
        assert_eq!(sprite.current, compositor.projector().project(p));
        assert_eq!(sprite.previous, compositor.projector().project(p - warp * dt));
    }

    #[test]
    fn test_non_finite_sprites_are_dropped() {
        let mut field = ParticleField::new(starfield_grid());
        field.spawn_all(VelocityInit::Zero, 5, 0);
        let mut compositor = starfield_compositor(SpriteShape::Streak);

        let p = field.positions()[0];
        // previous position lands exactly on the camera plane
        compositor.prepare(&field, Motion::Shared(Vec3::new(0.0, 0.0, p.z)), 1.0);

        assert!(compositor.sprites().len() < field.len());
        assert!(compositor.sprites().iter().all(|s| s.current.is_finite()));
    }

    #[test]
    fn test_paint_decays_then_draws() {
        let mut field = ParticleField::new(starfield_grid());
        field.spawn_all(VelocityInit::Zero, 9, 0);
        let mut compositor = starfield_compositor(SpriteShape::Star);
        let mut buffer = PixelBuffer::new(320, 240);
        buffer.fill(Vec3::ONE);

        compositor.paint(&mut buffer, &field, Motion::Shared(Vec3::ZERO), 1.0 / 60.0);

        let decayed = buffer.pixels().iter().filter(|p| **p == Vec3::splat(0.8)).count();
        assert!(decayed > 0);
        assert!(decayed < buffer.pixels().len());
    }

    #[test]
    fn test_banded_paint_matches_serial_draw() {
        let mut field = ParticleField::new(starfield_grid());
        field.spawn_all(VelocityInit::Signed { scale: 3000.0 }, 13, 0);
        let projector = Projector::new(UVec2::new(320, 240), 120.0, AspectScale::Width);
        let mut compositor = Compositor::new(projector, Shading::Gravity, SpriteShape::Trail, 0.5);

        let mut banded = PixelBuffer::new(320, 240);
        compositor.paint(&mut banded, &field, Motion::PerParticle, 1.0 / 60.0);

        let mut serial = PixelBuffer::new(320, 240);
        {
            let mut canvas = serial.canvas();
            for sprite in compositor.sprites() {
                sprite.draw(&mut canvas, SpriteShape::Trail);
            }
        }

        assert_eq!(banded, serial);
        assert!(banded.pixels().iter().any(|p| *p != Vec3::ZERO));
    }
}
