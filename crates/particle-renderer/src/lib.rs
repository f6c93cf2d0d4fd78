//! # Particle Renderer
//!
//! Software rasterization of particle fields and small meshes into an RGB
//! pixel buffer, plus the wgpu pass that puts that buffer on screen.

pub mod buffer;
pub mod camera;
pub mod compositor;
pub mod mesh;
pub mod raster;
pub mod renderer;
pub mod scene;

pub use buffer::*;
pub use camera::*;
pub use compositor::*;
pub use mesh::*;
pub use raster::{capsule, disc, segment_distance, star, star_sdf, Blend, PixelBox, STAR_FATNESS};
pub use renderer::*;
pub use scene::*;
