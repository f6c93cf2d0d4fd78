//! RGB float pixel buffer that the software rasterizer paints into
//!
//! Row 0 is the bottom of the image (y grows upward), matching the
//! screen-space convention of the projector.

use glam::Vec3;
use rayon::prelude::*;
use std::ops::Range;

/// Dense `width × height` image of unclamped RGB floats
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; (width * height) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    pub fn clear(&mut self) {
        self.fill(Vec3::ZERO);
    }

    pub fn fill(&mut self, color: Vec3) {
        self.pixels.par_iter_mut().for_each(|p| *p = color);
    }

    /// Multiply every pixel by `factor`; leaves a fading trail of earlier frames
    pub fn decay(&mut self, factor: f32) {
        self.pixels.par_iter_mut().for_each(|p| *p *= factor);
    }

    /// The whole image as one drawable canvas
    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas {
            pixels: &mut self.pixels,
            width: self.width,
            height: self.height,
            first_row: 0,
        }
    }

    /// Disjoint horizontal bands of `rows` rows each, for drawing in parallel.
    ///
    /// Each band owns its rows exclusively, so primitives drawn into different
    /// bands never touch the same pixel.
    pub fn par_bands(&mut self, rows: u32) -> impl IndexedParallelIterator<Item = Canvas<'_>> + '_ {
        let rows = rows.max(1);
        let width = self.width;
        let height = self.height;
        self.pixels
            .par_chunks_mut((width * rows).max(1) as usize)
            .enumerate()
            .map(move |(band, pixels)| Canvas {
                pixels,
                width,
                height,
                first_row: band as u32 * rows,
            })
    }

    /// 8-bit RGBA, top row first, channels clamped to `[0, 1]`
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.pixels.len() * 4];
        let row_bytes = self.width as usize * 4;
        if row_bytes == 0 {
            return out;
        }
        out.par_chunks_mut(row_bytes).enumerate().for_each(|(row, dst)| {
            let y = self.height as usize - 1 - row;
            let src = &self.pixels[y * self.width as usize..(y + 1) * self.width as usize];
            for (px, c) in dst.chunks_exact_mut(4).zip(src) {
                let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
                px[0] = c.x.round() as u8;
                px[1] = c.y.round() as u8;
                px[2] = c.z.round() as u8;
                px[3] = 255;
            }
        });
        out
    }
}

/// A run of full-width rows of a [`PixelBuffer`].
///
/// Coordinates are always in whole-image space; writes outside the band's
/// rows are skipped by the primitives via [`Canvas::rows`].
pub struct Canvas<'a> {
    pixels: &'a mut [Vec3],
    width: u32,
    height: u32,
    first_row: u32,
}

impl Canvas<'_> {
    /// Width of the whole image
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the whole image
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image rows owned by this canvas
    pub fn rows(&self) -> Range<i32> {
        let rows = self.pixels.len() as u32 / self.width.max(1);
        self.first_row as i32..(self.first_row + rows) as i32
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y as u32 - self.first_row) as usize * self.width as usize + x as usize
    }

    /// Overwrite a pixel. `(x, y)` must lie inside [`Canvas::rows`].
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: Vec3) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Read-modify-write add
    #[inline]
    pub fn add(&mut self, x: i32, y: i32, color: Vec3) {
        let i = self.index(x, y);
        self.pixels[i] += color;
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Vec3 {
        self.pixels[self.index(x, y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_twice_equals_squared_factor() {
        let mut a = PixelBuffer::new(8, 4);
        a.fill(Vec3::new(0.9, 2.0, 5.0));
        let mut b = a.clone();

        a.decay(0.8);
        a.decay(0.8);
        b.decay(0.8 * 0.8);

        for (pa, pb) in a.pixels().iter().zip(b.pixels()) {
            assert!((*pa - *pb).abs().max_element() < 1e-5);
        }
    }

    #[test]
    fn test_bands_cover_every_row_once() {
        let mut buffer = PixelBuffer::new(5, 11);
        let mut rows: Vec<Range<i32>> = buffer.par_bands(4).map(|c| c.rows()).collect();
        rows.sort_by_key(|r| r.start);

        assert_eq!(rows, vec![0..4, 4..8, 8..11]);
    }

    #[test]
    fn test_band_writes_land_in_image_coordinates() {
        let mut buffer = PixelBuffer::new(3, 6);
        buffer.par_bands(2).for_each(|mut canvas| {
            for y in canvas.rows() {
                canvas.set(1, y, Vec3::splat(y as f32));
            }
        });

        for y in 0..6 {
            assert_eq!(buffer.get(1, y), Vec3::splat(y as f32));
            assert_eq!(buffer.get(0, y), Vec3::ZERO);
        }
    }

    #[test]
    fn test_rgba8_flips_rows_and_clamps() {
        let mut buffer = PixelBuffer::new(1, 2);
        buffer.set(0, 0, Vec3::new(2.0, -1.0, 0.5));
        buffer.set(0, 1, Vec3::ONE);

        let bytes = buffer.to_rgba8();
        // top row (y = 1) first
        assert_eq!(&bytes[0..4], &[255, 255, 255, 255]);
        assert_eq!(&bytes[4..8], &[255, 0, 128, 255]);
    }
}
