//! Demo selection and per-demo parameters

use std::fmt;
use std::str::FromStr;

use glam::{UVec2, Vec3};
use particle_physics::{
    Gravity, GridSpec, VelocityInit, GRAVITY_SPAWN_SPEED, WARP_BIAS, WARP_SPEED, Z_FAR, Z_NEAR,
};
use particle_renderer::{AspectScale, PointLight, Projector, SpriteShape, MESH_COLOR, POINT_COLOR, POINT_RADIUS};

/// The four demos the host can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemoKind {
    Starfield,
    Gravity,
    MeshViewer,
    Canvas,
}

impl DemoKind {
    pub const ALL: [DemoKind; 4] = [
        DemoKind::Starfield,
        DemoKind::Gravity,
        DemoKind::MeshViewer,
        DemoKind::Canvas,
    ];

    /// Pixel buffer size the demo paints at
    pub fn resolution(&self) -> UVec2 {
        match self {
            DemoKind::Starfield => UVec2::new(1920, 1080),
            DemoKind::Gravity => UVec2::new(1920, 1280),
            DemoKind::MeshViewer => UVec2::new(1024, 1024),
            DemoKind::Canvas => UVec2::new(400, 400),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DemoKind::Starfield => "Starfield",
            DemoKind::Gravity => "Interstellar",
            DemoKind::MeshViewer => "Display Mesh",
            DemoKind::Canvas => "Canvas",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DemoKind::Starfield => "starfield",
            DemoKind::Gravity => "gravity",
            DemoKind::MeshViewer => "mesh",
            DemoKind::Canvas => "canvas",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown demo `{0}` (expected starfield, gravity, mesh or canvas)")]
pub struct UnknownDemo(pub String);

impl FromStr for DemoKind {
    type Err = UnknownDemo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starfield" | "warp" => Ok(DemoKind::Starfield),
            "gravity" | "nbody" => Ok(DemoKind::Gravity),
            "mesh" | "mesh-viewer" => Ok(DemoKind::MeshViewer),
            "canvas" => Ok(DemoKind::Canvas),
            _ => Err(UnknownDemo(s.to_string())),
        }
    }
}

/// Warp-speed flight through a grid of stars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldParams {
    pub resolution: UVec2,
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub spacing: u32,
    /// Per-frame brightness kept from the previous frame
    pub decay: f32,
    pub warp_speed: f32,
    pub warp_bias: f32,
    pub shape: SpriteShape,
}

impl Default for StarfieldParams {
    fn default() -> Self {
        Self {
            resolution: DemoKind::Starfield.resolution(),
            fov_degrees: 120.0,
            z_near: Z_NEAR,
            z_far: Z_FAR,
            spacing: 120,
            decay: 0.8,
            warp_speed: WARP_SPEED,
            warp_bias: WARP_BIAS,
            shape: SpriteShape::Star,
        }
    }
}

impl StarfieldParams {
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.resolution, self.z_near, self.z_far, self.spacing)
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.resolution, self.fov_degrees, AspectScale::Height)
    }
}

/// N-body gravity with motion trails
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    pub resolution: UVec2,
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub spacing: u32,
    pub decay: f32,
    pub spawn_speed: f32,
    pub gravity: Gravity,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            resolution: DemoKind::Gravity.resolution(),
            fov_degrees: 120.0,
            z_near: Z_NEAR,
            z_far: Z_FAR,
            spacing: 100,
            decay: 0.5,
            spawn_speed: GRAVITY_SPAWN_SPEED,
            gravity: Gravity::default(),
        }
    }
}

impl GravityParams {
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.resolution, self.z_near, self.z_far, self.spacing)
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.resolution, self.fov_degrees, AspectScale::Width)
    }

    pub fn spawn_velocity(&self) -> VelocityInit {
        VelocityInit::Signed {
            scale: self.spawn_speed,
        }
    }
}

/// Flat grid mesh seen from a fixed starting pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshViewerParams {
    pub resolution: UVec2,
    /// Quads per side
    pub n: u32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub fov_degrees: f32,
    pub light: PointLight,
    pub mesh_color: Vec3,
    pub point_color: Vec3,
    pub point_radius: f32,
    pub show_edges: bool,
}

impl Default for MeshViewerParams {
    fn default() -> Self {
        Self {
            resolution: DemoKind::MeshViewer.resolution(),
            n: 2,
            camera_position: Vec3::new(-1.82731234, 2.26492691, 2.27800684),
            camera_target: Vec3::new(-1.14022911, 1.79402169, 1.72468514),
            fov_degrees: 45.0,
            light: PointLight::default(),
            mesh_color: MESH_COLOR,
            point_color: POINT_COLOR,
            point_radius: POINT_RADIUS,
            show_edges: false,
        }
    }
}

/// Blank frame; the smallest possible host round trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasParams {
    pub resolution: UVec2,
    pub background: Vec3,
}

impl Default for CanvasParams {
    fn default() -> Self {
        Self {
            resolution: DemoKind::Canvas.resolution(),
            background: Vec3::ZERO,
        }
    }
}

/// Parameters of one demo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemoConfig {
    Starfield(StarfieldParams),
    Gravity(GravityParams),
    MeshViewer(MeshViewerParams),
    Canvas(CanvasParams),
}

impl DemoConfig {
    pub fn kind(&self) -> DemoKind {
        match self {
            DemoConfig::Starfield(_) => DemoKind::Starfield,
            DemoConfig::Gravity(_) => DemoKind::Gravity,
            DemoConfig::MeshViewer(_) => DemoKind::MeshViewer,
            DemoConfig::Canvas(_) => DemoKind::Canvas,
        }
    }

    pub fn resolution(&self) -> UVec2 {
        match self {
            DemoConfig::Starfield(p) => p.resolution,
            DemoConfig::Gravity(p) => p.resolution,
            DemoConfig::MeshViewer(p) => p.resolution,
            DemoConfig::Canvas(p) => p.resolution,
        }
    }
}

impl From<DemoKind> for DemoConfig {
    fn from(kind: DemoKind) -> Self {
        match kind {
            DemoKind::Starfield => DemoConfig::Starfield(StarfieldParams::default()),
            DemoKind::Gravity => DemoConfig::Gravity(GravityParams::default()),
            DemoKind::MeshViewer => DemoConfig::MeshViewer(MeshViewerParams::default()),
            DemoKind::Canvas => DemoConfig::Canvas(CanvasParams::default()),
        }
    }
}
