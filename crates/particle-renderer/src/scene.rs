//! Depth-buffered software renderer for small triangle meshes
//!
//! The mesh viewer submits vertices, triangle and edge indices, a camera and
//! a light; [`SceneRenderer::render`] turns that into pixels. Triangles are
//! flat-shaded (two-sided Lambert plus ambient), vertices are drawn as
//! depth-tested discs the size of a small sphere, edges optionally overlay
//! as thin lines.

use glam::{Mat4, UVec2, Vec2, Vec3};
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::camera::SceneCamera;
use crate::compositor::BAND_ROWS;
use crate::mesh::MeshGrid;
use crate::raster::{self, Blend};

pub const MESH_COLOR: Vec3 = Vec3::new(50.0 / 255.0, 144.0 / 255.0, 168.0 / 255.0);
pub const POINT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.0);
pub const POINT_RADIUS: f32 = 0.01;
pub const EDGE_COLOR: Vec3 = Vec3::ONE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.5, 1.0, 2.0),
            color: Vec3::ONE,
        }
    }
}

/// Everything needed to draw one frame of the mesh viewer
#[derive(Debug, Clone)]
pub struct SceneSubmission<'a> {
    pub vertices: &'a [Vec3],
    pub triangles: &'a [[u32; 3]],
    pub edges: &'a [[u32; 2]],
    pub camera: SceneCamera,
    pub light: PointLight,
    pub mesh_color: Vec3,
    pub point_color: Vec3,
    /// World-space radius of the vertex markers
    pub point_radius: f32,
    pub show_edges: bool,
}

impl<'a> SceneSubmission<'a> {
    pub fn new(mesh: &'a MeshGrid, camera: SceneCamera) -> Self {
        Self {
            vertices: &mesh.vertices,
            triangles: &mesh.triangles,
            edges: &mesh.edges,
            camera,
            light: PointLight::default(),
            mesh_color: MESH_COLOR,
            point_color: POINT_COLOR,
            point_radius: POINT_RADIUS,
            show_edges: false,
        }
    }
}

/// Triangle in screen space: xy in pixels, z in NDC depth
#[derive(Debug, Clone, Copy)]
struct ScreenTriangle {
    v: [Vec3; 3],
    color: Vec3,
}

impl ScreenTriangle {
    fn rows(&self) -> (i32, i32) {
        let lo = self.v[0].y.min(self.v[1].y).min(self.v[2].y);
        let hi = self.v[0].y.max(self.v[1].y).max(self.v[2].y);
        (lo.floor() as i32, hi.ceil() as i32 + 1)
    }
}

#[derive(Debug, Clone, Copy)]
struct ScreenPoint {
    center: Vec2,
    radius: f32,
    depth: f32,
}

fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Software scene renderer; owns the depth buffer between frames
pub struct SceneRenderer {
    depth: Vec<f32>,
    pub ambient: f32,
    pub background: Vec3,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            depth: Vec::new(),
            ambient: 0.1,
            background: Vec3::ZERO,
        }
    }

    /// Draw `scene` into `buffer`, replacing its contents
    pub fn render(&mut self, scene: &SceneSubmission, buffer: &mut PixelBuffer) {
        let viewport = UVec2::new(buffer.width(), buffer.height());
        let view_proj = scene.camera.view_projection();

        buffer.fill(self.background);
        self.depth.clear();
        self.depth.resize(buffer.pixels().len(), f32::INFINITY);

        let projected: Vec<Option<Vec3>> = scene
            .vertices
            .par_iter()
            .map(|v| scene.camera.project_to_screen(&view_proj, *v, viewport))
            .collect();

        let triangles: Vec<ScreenTriangle> = scene
            .triangles
            .par_iter()
            .filter_map(|t| self.shade_triangle(scene, &projected, t))
            .collect();

        let points: Vec<ScreenPoint> = scene
            .vertices
            .par_iter()
            .filter_map(|v| point_marker(scene, &view_proj, *v, viewport))
            .collect();

        let width = buffer.width() as usize;
        let band_len = (width * BAND_ROWS as usize).max(1);
        buffer
            .par_bands(BAND_ROWS)
            .zip(self.depth.par_chunks_mut(band_len))
            .for_each(|(mut canvas, depth)| {
                let rows = canvas.rows();
                let width = canvas.width() as i32;
                let height = canvas.height() as i32;
                let mut test_and_set = |x: i32, y: i32, z: f32| {
                    let i = (y - rows.start) as usize * width as usize + x as usize;
                    if z < depth[i] {
                        depth[i] = z;
                        true
                    } else {
                        false
                    }
                };

                for tri in &triangles {
                    let (lo, hi) = tri.rows();
                    if hi <= rows.start || lo >= rows.end {
                        continue;
                    }
                    let [a, b, c] = tri.v;
                    let area = edge_function(a.truncate(), b.truncate(), c.truncate());
                    if area == 0.0 {
                        continue;
                    }
                    let x0 = (a.x.min(b.x).min(c.x).floor() as i32).max(0);
                    let x1 = (a.x.max(b.x).max(c.x).ceil() as i32 + 1).min(width);
                    for y in lo.max(rows.start)..hi.min(rows.end).min(height) {
                        for x in x0..x1 {
                            let p = Vec2::new(x as f32, y as f32);
                            let w = Vec3::new(
                                edge_function(b.truncate(), c.truncate(), p),
                                edge_function(c.truncate(), a.truncate(), p),
                                edge_function(a.truncate(), b.truncate(), p),
                            ) / area;
                            if w.min_element() < 0.0 {
                                continue;
                            }
                            let z = w.dot(Vec3::new(a.z, b.z, c.z));
                            if test_and_set(x, y, z) {
                                canvas.set(x, y, tri.color);
                            }
                        }
                    }
                }

                for point in &points {
                    let pad = point.radius + 1.0;
                    let y0 = ((point.center.y - pad) as i32).max(rows.start);
                    let y1 = ((point.center.y + pad) as i32).min(rows.end);
                    let x0 = ((point.center.x - pad) as i32).max(0);
                    let x1 = ((point.center.x + pad) as i32).min(width);
                    for y in y0..y1 {
                        for x in x0..x1 {
                            if Vec2::new(x as f32, y as f32).distance(point.center) >= point.radius {
                                continue;
                            }
                            if test_and_set(x, y, point.depth) {
                                canvas.set(x, y, scene.point_color);
                            }
                        }
                    }
                }

                if scene.show_edges {
                    for e in scene.edges {
                        let (Some(a), Some(b)) = (projected[e[0] as usize], projected[e[1] as usize]) else {
                            continue;
                        };
                        raster::capsule(&mut canvas, a.truncate(), b.truncate(), 1.0, EDGE_COLOR, Blend::Overwrite);
                    }
                }
            });

        log::trace!(
            "scene: {} of {} triangles, {} points",
            triangles.len(),
            scene.triangles.len(),
            points.len()
        );
    }

    /// Screen-space triangle with its flat colour, or `None` if any corner is
    /// behind the camera
    fn shade_triangle(
        &self,
        scene: &SceneSubmission,
        projected: &[Option<Vec3>],
        t: &[u32; 3],
    ) -> Option<ScreenTriangle> {
        let v = [
            projected[t[0] as usize]?,
            projected[t[1] as usize]?,
            projected[t[2] as usize]?,
        ];
        let [a, b, c] = t.map(|i| scene.vertices[i as usize]);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let centroid = (a + b + c) / 3.0;
        let to_light = (scene.light.position - centroid).normalize_or_zero();
        let lambert = normal.dot(to_light).abs();
        let shade = self.ambient + (1.0 - self.ambient) * lambert;

        Some(ScreenTriangle {
            v,
            color: scene.mesh_color * scene.light.color * shade,
        })
    }
}

/// Disc for one vertex, depth taken at the sphere's front surface
fn point_marker(scene: &SceneSubmission, view_proj: &Mat4, v: Vec3, viewport: UVec2) -> Option<ScreenPoint> {
    let camera = &scene.camera;
    let center = camera.project_to_screen(view_proj, v, viewport)?;
    let to_camera = camera.position() - v;
    let front = v + to_camera.normalize_or_zero() * scene.point_radius;
    let depth = camera.project_to_screen(view_proj, front, viewport)?.z;
    let radius = scene.point_radius * camera.pixels_per_unit(to_camera.length(), viewport.y);

    Some(ScreenPoint {
        center: center.truncate(),
        radius,
        depth,
    })
}
