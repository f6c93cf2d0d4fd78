//! Analytic 2D primitives rasterized straight into a [`Canvas`]
//!
//! Each primitive takes an integer bounding box around the shape, clamps it
//! to the image on every side, and evaluates a distance or containment test
//! for every integer pixel coordinate inside. Shapes may be partly or fully
//! off-screen.

use glam::{Vec2, Vec3};
use std::ops::Range;

use crate::buffer::Canvas;

/// Star arm symmetry axis (cos 36°, -sin 36°)
const STAR_K1: Vec2 = Vec2::new(0.809_016_994_375, -0.587_785_252_292);

/// Inner-to-outer radius ratio of the star
pub const STAR_FATNESS: f32 = 0.6;

/// How a primitive combines with what is already in the buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    /// Hard-edged: write `color` where `d < r`
    Overwrite,
    /// Motion trails: add `color * (1 - d / r)²` where `d < r`
    AdditiveFalloff,
}

/// Half-open pixel rectangle, already clamped to the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: (i32, i32),
    pub y: (i32, i32),
}

impl PixelBox {
    /// Box spanning `[lo - pad, hi + pad]` with truncating casts, clamped to
    /// `width × height`
    pub fn spanning(lo: Vec2, hi: Vec2, pad: f32, width: u32, height: u32) -> Self {
        Self {
            x: (
                ((lo.x - pad) as i32).max(0),
                ((hi.x + pad) as i32).min(width as i32),
            ),
            y: (
                ((lo.y - pad) as i32).max(0),
                ((hi.y + pad) as i32).min(height as i32),
            ),
        }
    }

    pub fn width(&self) -> i32 {
        self.x.1 - self.x.0
    }

    pub fn height(&self) -> i32 {
        self.y.1 - self.y.0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Rows of the box that also belong to `rows`
    fn rows_within(&self, rows: &Range<i32>) -> Range<i32> {
        self.y.0.max(rows.start)..self.y.1.min(rows.end)
    }

    fn columns(&self) -> Range<i32> {
        self.x.0..self.x.1
    }
}

/// Filled disc, overwrite
pub fn disc(canvas: &mut Canvas, center: Vec2, radius: f32, color: Vec3) {
    let bounds = PixelBox::spanning(center, center, radius + 1.0, canvas.width(), canvas.height());
    for y in bounds.rows_within(&canvas.rows()) {
        for x in bounds.columns() {
            let pixel = Vec2::new(x as f32, y as f32);
            if pixel.distance(center) < radius {
                canvas.set(x, y, color);
            }
        }
    }
}

/// Distance from `q` to the segment `a`–`b`.
///
/// Projections that fall outside the segment measure to the nearer endpoint.
/// A zero-length segment is a point.
pub fn segment_distance(q: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len = ab.length();
    if len == 0.0 {
        return q.distance(a);
    }
    let dir = ab / len;
    let t = (q - a).dot(dir);
    if 0.0 < t && t < len {
        (q - a - dir * t).length()
    } else {
        q.distance(a).min(q.distance(b))
    }
}

/// Line segment of thickness `2 * radius` with round caps
pub fn capsule(canvas: &mut Canvas, p1: Vec2, p2: Vec2, radius: f32, color: Vec3, blend: Blend) {
    let bounds = PixelBox::spanning(p1.min(p2), p1.max(p2), radius + 1.0, canvas.width(), canvas.height());
    for y in bounds.rows_within(&canvas.rows()) {
        for x in bounds.columns() {
            let dist = segment_distance(Vec2::new(x as f32, y as f32), p1, p2);
            if dist >= radius {
                continue;
            }
            match blend {
                Blend::Overwrite => canvas.set(x, y, color),
                Blend::AdditiveFalloff => {
                    let falloff = 1.0 - dist / radius;
                    canvas.add(x, y, color * falloff * falloff);
                }
            }
        }
    }
}

/// Signed distance to a five-pointed star of outer radius `r` centred at the
/// origin, one arm pointing up. Negative inside.
///
/// The point is folded into the star's fundamental domain by mirroring at
/// `|x|` and the two arm axes, then measured against one silhouette edge.
pub fn star_sdf(mut p: Vec2, r: f32, fatness: f32) -> f32 {
    let k2 = Vec2::new(-STAR_K1.x, STAR_K1.y);

    p.x = p.x.abs();
    p -= 2.0 * STAR_K1.dot(p).max(0.0) * STAR_K1;
    p -= 2.0 * k2.dot(p).max(0.0) * k2;
    p.x = p.x.abs();
    p.y -= r;

    let ba = fatness * Vec2::new(-STAR_K1.y, STAR_K1.x) - Vec2::Y;
    let h = (p.dot(ba) / ba.dot(ba)).clamp(0.0, r);
    (p - ba * h).length() * sign(p.y * ba.x - p.x * ba.y)
}

// Like GLSL `sign`: zero stays zero
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Five-pointed star filling the box of half-size `radius + 1` around
/// `center`, overwrite.
///
/// The star is evaluated in the box's own normalised frame (`[-0.5, 0.5]`
/// on both axes), so a box clipped by the image edge squeezes the star.
pub fn star(canvas: &mut Canvas, center: Vec2, radius: f32, color: Vec3) {
    let bounds = PixelBox::spanning(center, center, radius + 1.0, canvas.width(), canvas.height());
    if bounds.is_empty() {
        return;
    }
    let size = Vec2::new(bounds.width() as f32, bounds.height() as f32);
    let box_center = Vec2::new(
        (bounds.x.0 + bounds.x.1) as f32 * 0.5,
        (bounds.y.0 + bounds.y.1) as f32 * 0.5,
    );
    let r = radius / size.x;

    for y in bounds.rows_within(&canvas.rows()) {
        for x in bounds.columns() {
            let p = (Vec2::new(x as f32, y as f32) - box_center) / size;
            if star_sdf(p, r, STAR_FATNESS) < 0.0 {
                canvas.set(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use rayon::iter::ParallelIterator;

    const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    fn painted(buffer: &PixelBuffer) -> usize {
        buffer.pixels().iter().filter(|p| **p != Vec3::ZERO).count()
    }

    #[test]
    fn test_disc_paints_inside_only() {
        let mut buffer = PixelBuffer::new(40, 40);
        disc(&mut buffer.canvas(), Vec2::new(20.0, 20.0), 5.0, RED);

        assert_eq!(buffer.get(20, 20), RED);
        assert_eq!(buffer.get(24, 20), RED);
        assert_eq!(buffer.get(25, 20), Vec3::ZERO);
        assert_eq!(buffer.get(24, 24), Vec3::ZERO);
    }

    #[test]
    fn test_segment_distance_cases() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(segment_distance(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(segment_distance(Vec2::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(segment_distance(Vec2::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn test_capsule_midpoint_painted_and_radius_respected() {
        let mut buffer = PixelBuffer::new(64, 64);
        let p1 = Vec2::new(10.0, 30.0);
        let p2 = Vec2::new(50.0, 30.0);
        let radius = 4.0;
        capsule(&mut buffer.canvas(), p1, p2, radius, RED, Blend::Overwrite);

        assert_eq!(buffer.get(30, 30), RED);
        assert_eq!(buffer.get(30, 33), RED);
        // exactly at the radius: never painted
        assert_eq!(buffer.get(30, 34), Vec3::ZERO);

        for y in 0..64 {
            for x in 0..64 {
                let d = segment_distance(Vec2::new(x as f32, y as f32), p1, p2);
                let is_painted = buffer.get(x, y) != Vec3::ZERO;
                assert_eq!(is_painted, d < radius, "pixel ({x}, {y}) at distance {d}");
            }
        }
    }

    #[test]
    fn test_additive_capsule_falls_off_and_accumulates() {
        let mut buffer = PixelBuffer::new(32, 32);
        let p = Vec2::new(16.0, 16.0);
        capsule(&mut buffer.canvas(), p, p, 4.0, Vec3::ONE, Blend::AdditiveFalloff);

        assert_eq!(buffer.get(16, 16), Vec3::ONE);
        assert_eq!(buffer.get(18, 16), Vec3::splat(0.25));
        assert_eq!(buffer.get(20, 16), Vec3::ZERO);

        capsule(&mut buffer.canvas(), p, p, 4.0, Vec3::ONE, Blend::AdditiveFalloff);
        assert_eq!(buffer.get(16, 16), Vec3::splat(2.0));
    }

    #[test]
    fn test_primitives_clip_at_image_edges() {
        let mut buffer = PixelBuffer::new(16, 16);
        disc(&mut buffer.canvas(), Vec2::new(-2.0, 8.0), 5.0, RED);
        capsule(&mut buffer.canvas(), Vec2::new(-50.0, -50.0), Vec2::new(100.0, 100.0), 2.0, RED, Blend::Overwrite);
        star(&mut buffer.canvas(), Vec2::new(15.0, 15.0), 6.0, RED);
        star(&mut buffer.canvas(), Vec2::new(-100.0, -100.0), 6.0, RED);

        assert_eq!(buffer.get(0, 8), RED);
        assert_eq!(buffer.get(8, 8), RED);
        assert!(painted(&buffer) > 0);
    }

    #[test]
    fn test_star_sdf_is_mirror_symmetric() {
        for i in -20..=20 {
            for j in -20..=20 {
                let p = Vec2::new(i as f32 * 0.025, j as f32 * 0.025);
                let mirrored = Vec2::new(-p.x, p.y);
                assert_eq!(star_sdf(p, 0.4, STAR_FATNESS), star_sdf(mirrored, 0.4, STAR_FATNESS));
            }
        }
    }

    #[test]
    fn test_star_sdf_inside_and_outside() {
        assert!(star_sdf(Vec2::ZERO, 0.4, STAR_FATNESS) < 0.0);
        // tip of the top arm lies on the outline
        assert!(star_sdf(Vec2::new(0.0, 0.39), 0.4, STAR_FATNESS) < 0.0);
        assert!(star_sdf(Vec2::new(0.0, 0.41), 0.4, STAR_FATNESS) > 0.0);
        // notch between the top arm and a side arm
        let notch = Vec2::new(0.4 * 36f32.to_radians().sin(), 0.4 * 36f32.to_radians().cos());
        assert!(star_sdf(notch, 0.4, STAR_FATNESS) > 0.0);
    }

    #[test]
    fn test_rendered_star_is_mirror_symmetric() {
        let mut buffer = PixelBuffer::new(100, 100);
        star(&mut buffer.canvas(), Vec2::new(50.0, 50.0), 10.0, RED);

        assert_eq!(buffer.get(50, 50), RED);
        assert!(painted(&buffer) > 20);
        for y in 39..61 {
            for dx in 0..=10 {
                assert_eq!(buffer.get(50 + dx, y), buffer.get(50 - dx, y), "row {y}, dx {dx}");
            }
        }
    }

    #[test]
    fn test_banded_drawing_matches_whole_canvas() {
        let mut whole = PixelBuffer::new(48, 48);
        let mut banded = PixelBuffer::new(48, 48);

        fn draw(canvas: &mut Canvas) {
            star(canvas, Vec2::new(20.0, 22.0), 9.0, RED);
            capsule(canvas, Vec2::new(3.0, 40.0), Vec2::new(44.0, 5.0), 3.0, Vec3::ONE, Blend::AdditiveFalloff);
            disc(canvas, Vec2::new(30.0, 30.0), 4.0, Vec3::Z);
        }

        draw(&mut whole.canvas());
        for mut canvas in banded.par_bands(5).collect::<Vec<_>>() {
            draw(&mut canvas);
        }

        assert_eq!(whole, banded);
    }
}
