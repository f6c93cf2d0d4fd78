//! Cameras: the pinhole projector used by the particle demos and an orbit
//! camera for the mesh viewer

use glam::{Mat3, Mat4, Quat, UVec2, Vec2, Vec3};

/// Which screen dimension the normalised projection is scaled by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectScale {
    /// Starfield convention
    Height,
    /// N-body convention
    Width,
}

/// Pinhole projection for a camera sitting at the screen centre, looking
/// down +z. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    resolution: Vec2,
    fov_degrees: f32,
    tan_half_fov: f32,
    scale: AspectScale,
}

impl Projector {
    pub fn new(resolution: UVec2, fov_degrees: f32, scale: AspectScale) -> Self {
        Self {
            resolution: resolution.as_vec2(),
            fov_degrees,
            tan_half_fov: (fov_degrees / 360.0 * std::f32::consts::PI).tan(),
            scale,
        }
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn tan_half_fov(&self) -> f32 {
        self.tan_half_fov
    }

    fn scale_factor(&self) -> f32 {
        match self.scale {
            AspectScale::Height => self.resolution.y,
            AspectScale::Width => self.resolution.x,
        }
    }

    /// World point to screen point.
    ///
    /// Requires `p.z > 0`. The steppers keep every particle inside
    /// `(z_near, z_far)`, so this is never checked here; a point at or behind
    /// the camera gives a non-finite or mirrored result.
    pub fn project(&self, p: Vec3) -> Vec2 {
        let center = self.resolution / 2.0;
        let w = self.tan_half_fov * p.z;
        let rel = (p.truncate() - center) / w;
        rel * self.scale_factor() + center
    }
}

/// Orbit camera for the mesh viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    pub distance: f32,
    pub rotation: Quat,
    pub target: Vec3,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl SceneCamera {
    /// Camera at `position` looking at `target`, with world +Y kept up
    pub fn look_at(position: Vec3, target: Vec3, fovy_degrees: f32, viewport: UVec2) -> Self {
        let offset = position - target;
        let back = offset.normalize();
        let right = Vec3::Y.cross(back).normalize();
        let up = back.cross(right);
        let rotation = Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize();

        Self {
            distance: offset.length(),
            rotation,
            target,
            aspect: viewport.x as f32 / viewport.y.max(1) as f32,
            fovy: fovy_degrees.to_radians(),
            znear: 0.01,
            zfar: 1000.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let offset = self.rotation * Vec3::new(0.0, 0.0, self.distance);
        self.target + offset
    }

    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        let yaw_rotation = Quat::from_axis_angle(Vec3::Y, delta_x);

        let right = self.rotation * Vec3::X;
        let pitch_rotation = Quat::from_axis_angle(right, -delta_y);

        self.rotation = yaw_rotation * pitch_rotation * self.rotation;
        self.rotation = self.rotation.normalize();
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance + delta).clamp(0.05, 100.0);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_projection(&self) -> Mat4 {
        let position = self.position();
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-position);
        let view = rotation_matrix * translation_matrix;
        let proj = Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    /// Pixel position (row 0 at the bottom) and NDC depth, or `None` when the
    /// point is behind the camera
    pub fn project_to_screen(&self, view_proj: &Mat4, world: Vec3, viewport: UVec2) -> Option<Vec3> {
        let clip = *view_proj * world.extend(1.0);
        if clip.w <= self.znear {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let size = viewport.as_vec2();
        Some(Vec3::new(
            (ndc.x * 0.5 + 0.5) * size.x,
            (ndc.y * 0.5 + 0.5) * size.y,
            ndc.z,
        ))
    }

    /// Pixels per world unit at view depth `w`
    pub fn pixels_per_unit(&self, w: f32, viewport_height: u32) -> f32 {
        viewport_height as f32 / (2.0 * (self.fovy * 0.5).tan() * w)
    }
}
