//! Warpfield
//!
//! CPU particle demos (starfield warp, N-body gravity, mesh viewer, blank
//! canvas) painted by a software rasterizer and shown through wgpu.
//!
//! Usage: `warpfield [starfield|gravity|mesh|canvas]`. Set `WARPFIELD_SEED`
//! to replay a run.

mod presenter;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use particle_physics::entropy_seed;
use particle_simulation::{DemoKind, Simulation, FIXED_DT};
use presenter::{Presenter, PresenterError};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const SEED_VAR: &str = "WARPFIELD_SEED";

/// Run seed from `WARPFIELD_SEED` (decimal or `0x` hex), else fresh entropy
fn run_seed() -> u64 {
    let Ok(raw) = std::env::var(SEED_VAR) else {
        return entropy_seed();
    };
    match parse_seed(&raw) {
        Some(seed) => seed,
        None => {
            log::warn!("{SEED_VAR}={raw:?} is not a number, using a random seed");
            entropy_seed()
        }
    }
}

fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Rolling average over the last 100 frames
struct FrameTimer {
    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(100),
            last_frame_time: Instant::now(),
        }
    }

    /// Record a frame; returns (fps, average frame time in ms)
    fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > 100 {
            self.frame_times.pop_front();
        }

        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        (1000.0 / avg_frame_time.max(1e-3), avg_frame_time)
    }
}

struct App {
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    simulation: Simulation,
    seed: u64,
    paused: bool,
    timer: FrameTimer,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new(demo: DemoKind, seed: u64) -> Self {
        Self {
            window: None,
            presenter: None,
            simulation: Simulation::new(demo, seed),
            seed,
            paused: false,
            timer: FrameTimer::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), PresenterError> {
        let resolution = self.simulation.resolution();
        let window_attributes = Window::default_attributes()
            .with_title(self.simulation.kind().title())
            .with_inner_size(winit::dpi::LogicalSize::new(resolution.x, resolution.y));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let presenter = pollster::block_on(Presenter::new(window.clone(), resolution.x, resolution.y))?;
        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }

    fn switch_demo(&mut self, demo: DemoKind) {
        if demo == self.simulation.kind() {
            return;
        }
        log::info!("Switching to {demo}");
        self.simulation = Simulation::new(demo, self.seed);
        self.mouse_pressed = false;
        self.last_mouse_pos = None;

        if let Some(window) = &self.window {
            let resolution = demo.resolution();
            let _ = window.request_inner_size(winit::dpi::LogicalSize::new(resolution.x, resolution.y));
            window.set_title(demo.title());
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Digit1 => self.switch_demo(DemoKind::Starfield),
            KeyCode::Digit2 => self.switch_demo(DemoKind::Gravity),
            KeyCode::Digit3 => self.switch_demo(DemoKind::MeshViewer),
            KeyCode::Digit4 => self.switch_demo(DemoKind::Canvas),
            KeyCode::Space => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
            }
            KeyCode::KeyR => self.simulation.reset(),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(presenter)) = (&self.window, &mut self.presenter) else {
            return;
        };

        if !self.paused {
            self.simulation.tick(FIXED_DT);
        }

        match presenter.present(self.simulation.frame()) {
            Ok(()) => {
                let (fps, frame_time) = self.timer.tick();
                window.set_title(&format!(
                    "{} - {:.0} FPS ({:.2}ms) - {} particles{}",
                    self.simulation.kind().title(),
                    fps,
                    frame_time,
                    self.simulation.particle_count(),
                    if self.paused { " [paused]" } else { "" }
                ));
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {e:?}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.open(event_loop) {
                log::error!("Failed to start: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(physical_size);
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key_code),

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Right {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let delta_x = (position.x - last_pos.0) as f32;
                        let delta_y = (position.y - last_pos.1) as f32;

                        if let Some(camera) = self.simulation.scene_camera_mut() {
                            camera.rotate(-delta_x * 0.005, delta_y * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };

                if let Some(camera) = self.simulation.scene_camera_mut() {
                    camera.zoom(-scroll * camera.distance / 100.0);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demo = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<DemoKind>()?,
        None => DemoKind::Starfield,
    };
    let seed = run_seed();
    log::info!("Starting {demo} (seed {seed:#x}, replay with {SEED_VAR}={seed:#x})");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(demo, seed);
    event_loop.run_app(&mut app)?;
    Ok(())
}
