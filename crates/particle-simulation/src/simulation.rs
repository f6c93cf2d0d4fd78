//! Frame-tick driver for the demos
//!
//! The host calls [`Simulation::tick`] once per frame and presents the
//! returned pixel buffer. Particle field, scene state and pixel buffer are
//! allocated once in [`Simulation::new`] and reused for the life of the run.

use glam::UVec2;
use particle_physics::{
    GravityStepper, ParticleField, StarfieldStepper, VelocityInit, WarpVelocity, FIXED_DT as PHYSICS_DT,
};
use particle_renderer::{
    Compositor, MeshGrid, Motion, PixelBuffer, SceneCamera, SceneRenderer, SceneSubmission, Shading, SpriteShape,
};

use crate::params::{
    CanvasParams, DemoConfig, DemoKind, GravityParams, MeshViewerParams, StarfieldParams,
};

/// Time step every demo is designed for
pub const FIXED_DT: f32 = PHYSICS_DT;

enum Demo {
    Starfield {
        params: StarfieldParams,
        field: ParticleField,
        stepper: StarfieldStepper,
        compositor: Compositor,
    },
    Gravity {
        params: GravityParams,
        field: ParticleField,
        stepper: GravityStepper,
        compositor: Compositor,
        respawned: usize,
    },
    MeshViewer {
        params: MeshViewerParams,
        mesh: MeshGrid,
        camera: SceneCamera,
        renderer: SceneRenderer,
    },
    Canvas {
        params: CanvasParams,
    },
}

impl Demo {
    fn new(config: DemoConfig, seed: u64) -> Self {
        match config {
            DemoConfig::Starfield(params) => {
                let mut field = ParticleField::new(params.grid());
                field.spawn_all(VelocityInit::Zero, seed, 0);
                let stepper = StarfieldStepper {
                    warp: WarpVelocity {
                        speed: params.warp_speed,
                        bias: params.warp_bias,
                        ..WarpVelocity::default()
                    },
                };
                let compositor = Compositor::new(params.projector(), Shading::Starfield, params.shape, params.decay);
                Demo::Starfield {
                    params,
                    field,
                    stepper,
                    compositor,
                }
            }
            DemoConfig::Gravity(params) => {
                let mut field = ParticleField::new(params.grid());
                field.spawn_all(params.spawn_velocity(), seed, 0);
                let stepper = GravityStepper {
                    gravity: params.gravity,
                    spawn_velocity: params.spawn_velocity(),
                    seed,
                };
                let compositor =
                    Compositor::new(params.projector(), Shading::Gravity, SpriteShape::Trail, params.decay);
                Demo::Gravity {
                    params,
                    field,
                    stepper,
                    compositor,
                    respawned: 0,
                }
            }
            DemoConfig::MeshViewer(params) => Demo::MeshViewer {
                params,
                mesh: MeshGrid::new(params.n),
                camera: SceneCamera::look_at(
                    params.camera_position,
                    params.camera_target,
                    params.fov_degrees,
                    params.resolution,
                ),
                renderer: SceneRenderer::new(),
            },
            DemoConfig::Canvas(params) => Demo::Canvas { params },
        }
    }

    fn config(&self) -> DemoConfig {
        match self {
            Demo::Starfield { params, .. } => DemoConfig::Starfield(*params),
            Demo::Gravity { params, .. } => DemoConfig::Gravity(*params),
            Demo::MeshViewer { params, .. } => DemoConfig::MeshViewer(*params),
            Demo::Canvas { params } => DemoConfig::Canvas(*params),
        }
    }
}

/// One running demo: its state, its clock and the frame it paints
pub struct Simulation {
    kind: DemoKind,
    seed: u64,
    demo: Demo,
    frame: PixelBuffer,
    time: f32,
    tick_count: u64,
}

impl Simulation {
    /// Demo `kind` with its default parameters
    pub fn new(kind: DemoKind, seed: u64) -> Self {
        Self::with_config(DemoConfig::from(kind), seed)
    }

    pub fn with_config(config: DemoConfig, seed: u64) -> Self {
        let kind = config.kind();
        let resolution = config.resolution();
        let demo = Demo::new(config, seed);
        let frame = PixelBuffer::new(resolution.x, resolution.y);

        let simulation = Self {
            kind,
            seed,
            demo,
            frame,
            time: 0.0,
            tick_count: 0,
        };
        log::info!(
            "✓ {} ready: {}x{}, {} particles",
            kind.title(),
            resolution.x,
            resolution.y,
            simulation.particle_count()
        );
        log::debug!("{kind} seed: {seed:#018x}");
        simulation
    }

    /// Advance one frame and paint it
    pub fn tick(&mut self, dt: f32) -> &PixelBuffer {
        self.tick_count += 1;
        let tick = self.tick_count;

        match &mut self.demo {
            Demo::Starfield {
                field,
                stepper,
                compositor,
                ..
            } => {
                self.time += dt;
                stepper.warp.update(self.time);
                stepper.step(field, dt);
                compositor.paint(&mut self.frame, field, Motion::Shared(stepper.warp.velocity), dt);
            }
            Demo::Gravity {
                field,
                stepper,
                compositor,
                respawned,
                ..
            } => {
                *respawned = stepper.tick(field, dt, tick);
                self.time += dt;
                compositor.paint(&mut self.frame, field, Motion::PerParticle, dt);
                log::trace!("tick {tick}: {respawned} respawned");
            }
            Demo::MeshViewer {
                params,
                mesh,
                camera,
                renderer,
            } => {
                self.time += dt;
                let scene = SceneSubmission {
                    light: params.light,
                    mesh_color: params.mesh_color,
                    point_color: params.point_color,
                    point_radius: params.point_radius,
                    show_edges: params.show_edges,
                    ..SceneSubmission::new(mesh, *camera)
                };
                renderer.render(&scene, &mut self.frame);
            }
            Demo::Canvas { params } => {
                self.time += dt;
                self.frame.fill(params.background);
            }
        }

        &self.frame
    }

    /// Last painted frame
    pub fn frame(&self) -> &PixelBuffer {
        &self.frame
    }

    /// Simulated seconds since start or the last reset
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn kind(&self) -> DemoKind {
        self.kind
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn resolution(&self) -> UVec2 {
        UVec2::new(self.frame.width(), self.frame.height())
    }

    /// Particle field of the particle demos
    pub fn field(&self) -> Option<&ParticleField> {
        match &self.demo {
            Demo::Starfield { field, .. } | Demo::Gravity { field, .. } => Some(field),
            Demo::MeshViewer { .. } | Demo::Canvas { .. } => None,
        }
    }

    /// Particles (or mesh vertices) on screen
    pub fn particle_count(&self) -> usize {
        match &self.demo {
            Demo::Starfield { field, .. } | Demo::Gravity { field, .. } => field.len(),
            Demo::MeshViewer { mesh, .. } => mesh.vertices.len(),
            Demo::Canvas { .. } => 0,
        }
    }

    /// Particles respawned by the last gravity tick
    pub fn respawned(&self) -> usize {
        match &self.demo {
            Demo::Gravity { respawned, .. } => *respawned,
            _ => 0,
        }
    }

    /// Orbit camera of the mesh viewer
    pub fn scene_camera_mut(&mut self) -> Option<&mut SceneCamera> {
        match &mut self.demo {
            Demo::MeshViewer { camera, .. } => Some(camera),
            _ => None,
        }
    }

    /// Restart from tick zero with the same seed; the run replays exactly
    pub fn reset(&mut self) {
        log::info!("{} reset", self.kind.title());
        self.demo = Demo::new(self.demo.config(), self.seed);
        self.frame.clear();
        self.time = 0.0;
        self.tick_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{UVec3, Vec3};

    fn small_starfield() -> DemoConfig {
        DemoConfig::Starfield(StarfieldParams {
            resolution: UVec2::new(320, 180),
            spacing: 40,
            ..StarfieldParams::default()
        })
    }

    fn small_gravity() -> DemoConfig {
        DemoConfig::Gravity(GravityParams {
            resolution: UVec2::new(400, 300),
            z_far: 800.0,
            spacing: 100,
            ..GravityParams::default()
        })
    }

    #[test]
    fn test_starfield_ticks_advance_clock_and_paint() {
        let mut sim = Simulation::with_config(small_starfield(), 1);
        assert_eq!(sim.field().map(|f| f.dims()), Some(UVec3::new(8, 4, 75)));

        for _ in 0..30 {
            sim.tick(FIXED_DT);
        }

        assert_eq!(sim.tick_count(), 30);
        assert!((sim.time() - 0.5).abs() < 1e-4);
        assert!(sim.frame().pixels().iter().any(|p| *p != Vec3::ZERO));
        for p in sim.field().into_iter().flat_map(|f| f.positions()) {
            assert!(p.z > 200.0 && p.z < 3200.0);
        }
    }

    #[test]
    fn test_gravity_stays_in_bounds() {
        let mut sim = Simulation::with_config(small_gravity(), 2);
        for _ in 0..20 {
            sim.tick(FIXED_DT);
            let field = sim.field().unwrap();
            for p in field.positions() {
                assert!(field.grid().contains(*p));
            }
        }
        assert_eq!(sim.particle_count(), 4 * 3 * 6);
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let mut a = Simulation::with_config(small_gravity(), 99);
        let mut b = Simulation::with_config(small_gravity(), 99);
        for _ in 0..10 {
            a.tick(FIXED_DT);
            b.tick(FIXED_DT);
        }
        assert_eq!(a.field().unwrap().positions(), b.field().unwrap().positions());
        assert_eq!(a.frame(), b.frame());
    }

    #[test]
    fn test_reset_restarts_run() {
        let mut sim = Simulation::with_config(small_starfield(), 7);
        let initial = sim.field().unwrap().positions().to_vec();
        sim.tick(FIXED_DT);
        sim.tick(FIXED_DT);

        sim.reset();

        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.field().unwrap().positions(), initial.as_slice());
        assert!(sim.frame().pixels().iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn test_mesh_viewer_renders_and_exposes_camera() {
        let config = DemoConfig::MeshViewer(MeshViewerParams {
            resolution: UVec2::new(128, 128),
            ..MeshViewerParams::default()
        });
        let mut sim = Simulation::with_config(config, 0);
        assert!(sim.field().is_none());
        assert_eq!(sim.particle_count(), 9);

        let frame = sim.tick(FIXED_DT);
        assert!(frame.pixels().iter().any(|p| *p != Vec3::ZERO));

        let camera = sim.scene_camera_mut().unwrap();
        let before = camera.position();
        camera.rotate(0.3, 0.0);
        assert!((camera.position() - before).length() > 1e-3);
    }

    #[test]
    fn test_canvas_is_blank() {
        let mut sim = Simulation::new(DemoKind::Canvas, 0);
        assert_eq!(sim.resolution(), UVec2::new(400, 400));
        assert!(sim.scene_camera_mut().is_none());
        let frame = sim.tick(FIXED_DT);
        assert!(frame.pixels().iter().all(|p| *p == Vec3::ZERO));
    }
}
