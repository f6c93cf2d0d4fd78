//! Per-tick particle updates
//!
//! Every particle goes Integrate -> BoundaryCheck -> (Respawn | NoOp). The
//! two demos differ in what drives the motion and what happens at the
//! boundary.

use std::f32::consts::PI;

use glam::Vec3;
use rayon::prelude::*;

use crate::constants::{GRAVITY_SPAWN_SPEED, WARP_BIAS, WARP_SPEED};
use crate::field::{unflatten, ParticleField};
use crate::forces::Gravity;
use crate::particle::{Particle, VelocityInit};
use crate::rng::slot_rng;

/// Shared forward velocity of the starfield.
///
/// One value for the whole field, not per particle. Only `z` is driven; it
/// oscillates so the warp speeds up and slows down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpVelocity {
    pub velocity: Vec3,
    pub speed: f32,
    pub bias: f32,
}

impl Default for WarpVelocity {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            speed: WARP_SPEED,
            bias: WARP_BIAS,
        }
    }
}

impl WarpVelocity {
    /// `vel.z = -speed * (bias + cos(t π))`, called once per frame before stepping
    pub fn update(&mut self, t: f32) {
        self.velocity.z = -self.speed * (self.bias + (t * PI).cos());
    }
}

/// Starfield motion: constant shared velocity, depth wraps around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldStepper {
    pub warp: WarpVelocity,
}

impl StarfieldStepper {
    pub fn new() -> Self {
        Self {
            warp: WarpVelocity::default(),
        }
    }

    pub fn step(&self, field: &mut ParticleField, dt: f32) {
        let grid = *field.grid();
        let vel = self.warp.velocity;
        let depth = grid.depth_range();

        field.par_slots_mut().for_each(|(_, slot)| {
            let p = slot.position;
            *p += vel * dt;
            // Wrap depth only. The x jump is a stylistic scatter, not physics.
            if p.z <= grid.z_near {
                p.z = grid.clamp_depth(p.z + depth);
                p.x = vel.z * p.x.cos();
            }
        });
    }
}

impl Default for StarfieldStepper {
    fn default() -> Self {
        Self::new()
    }
}

/// N-body motion: pairwise gravity, unit masses, respawn when leaving the box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityStepper {
    pub gravity: Gravity,
    pub spawn_velocity: VelocityInit,
    pub seed: u64,
}

impl GravityStepper {
    pub fn new(seed: u64) -> Self {
        Self {
            gravity: Gravity::default(),
            spawn_velocity: VelocityInit::Signed {
                scale: GRAVITY_SPAWN_SPEED,
            },
            seed,
        }
    }

    /// Fill the force accumulators for the current positions
    pub fn compute_forces(&self, field: &mut ParticleField) {
        let (positions, forces) = field.positions_and_forces_mut();
        self.gravity.accumulate(positions, forces);
    }

    /// Integrate with the accumulated forces and respawn escapees.
    ///
    /// Returns how many particles were respawned.
    pub fn step(&self, field: &mut ParticleField, dt: f32, tick: u64) -> usize {
        let grid = *field.grid();
        let dims = field.dims();
        let seed = self.seed;
        let spawn_velocity = self.spawn_velocity;

        field
            .par_slots_mut()
            .map(|(i, mut slot)| {
                *slot.velocity += *slot.force * dt;
                *slot.position += *slot.velocity * dt;

                if grid.contains(*slot.position) {
                    return 0;
                }
                let mut rng = slot_rng(seed, tick, i);
                slot.write(Particle::spawn(&grid, unflatten(dims, i), spawn_velocity, &mut rng));
                1
            })
            .sum()
    }

    /// Force pass followed by the integrate pass
    pub fn tick(&self, field: &mut ParticleField, dt: f32, tick: u64) -> usize {
        self.compute_forces(field);
        self.step(field, dt, tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::GridSpec;
    use glam::{UVec2, UVec3};

    fn starfield() -> ParticleField {
        let mut field = ParticleField::new(GridSpec::new(UVec2::new(1920, 1080), 200.0, 3200.0, 120));
        field.spawn_all(VelocityInit::Zero, 21, 0);
        field
    }

    fn gravity_field(resolution: UVec2, spacing: u32) -> ParticleField {
        let mut field = ParticleField::new(GridSpec::new(resolution, 200.0, 3200.0, spacing));
        field.spawn_all(VelocityInit::Signed { scale: 50.0 }, 8, 0);
        field
    }

    #[test]
    fn test_warp_velocity_oscillates() {
        let mut warp = WarpVelocity::default();
        warp.update(0.0);
        assert!((warp.velocity.z + 2200.0).abs() < 1e-3);
        warp.update(1.0);
        assert!((warp.velocity.z + 200.0).abs() < 1e-2);
        assert_eq!(warp.velocity.x, 0.0);
        assert_eq!(warp.velocity.y, 0.0);
    }

    #[test]
    fn test_starfield_depth_stays_in_range() {
        let mut field = starfield();
        let mut stepper = StarfieldStepper::new();
        let dt = 1.0 / 60.0;

        let mut t = 0.0;
        for _ in 0..240 {
            t += dt;
            stepper.warp.update(t);
            stepper.step(&mut field, dt);
            for p in field.positions() {
                assert!(p.z > 200.0 && p.z < 3200.0, "z = {}", p.z);
            }
        }
    }

    #[test]
    fn test_starfield_wrap_moves_to_back() {
        let mut field = starfield();
        let mut stepper = StarfieldStepper::new();
        stepper.warp.velocity.z = -600.0;
        field.set_position(0, Vec3::new(0.5, 10.0, 205.0));

        stepper.step(&mut field, 1.0 / 60.0);

        let p = field.positions()[0];
        assert!((p.z - 3195.0).abs() < 1e-3);
        assert!((p.x - (-600.0 * 0.5f32.cos())).abs() < 1e-3);
        assert_eq!(p.y, 10.0);
    }

    #[test]
    fn test_starfield_without_wrap_only_moves_depth() {
        let mut field = starfield();
        let mut stepper = StarfieldStepper::new();
        stepper.warp.velocity.z = -60.0;
        field.set_position(0, Vec3::new(100.0, 50.0, 1000.0));

        stepper.step(&mut field, 1.0 / 60.0);

        let p = field.positions()[0];
        assert_eq!(p.x, 100.0);
        assert_eq!(p.y, 50.0);
        assert!((p.z - 999.0).abs() < 1e-3);
    }

    #[test]
    fn test_gravity_keeps_particles_in_box() {
        let mut field = gravity_field(UVec2::new(600, 400), 100);
        let stepper = GravityStepper::new(8);

        for tick in 1..=60 {
            stepper.tick(&mut field, 1.0 / 60.0, tick);
            for p in field.positions() {
                assert!(field.grid().contains(*p), "escaped: {p}");
            }
        }
    }

    #[test]
    fn test_gravity_respawns_escapee() {
        let mut field = gravity_field(UVec2::new(600, 400), 100);
        let stepper = GravityStepper::new(8);
        field.set_position(5, Vec3::new(-50.0, 100.0, 1000.0));

        let respawned = stepper.step(&mut field, 1.0 / 60.0, 1);

        assert!(respawned >= 1);
        let expected_cell = field.grid_index(5);
        let p = field.positions()[5];
        assert!(field.grid().contains(p));
        assert_eq!((p.x / 100.0) as u32, expected_cell.x);
    }

    #[test]
    fn test_gravity_force_points_toward_others() {
        // 2 x 2 x 2 grid, particles at the corners of a box
        let mut field = ParticleField::new(GridSpec::new(UVec2::new(200, 200), 200.0, 400.0, 100));
        assert_eq!(field.dims(), UVec3::splat(2));

        for (flat, index) in field.indices().collect::<Vec<_>>().into_iter().enumerate() {
            let p = index.as_vec3() * Vec3::new(80.0, 60.0, 70.0) + Vec3::new(50.0, 60.0, 250.0);
            field.set_position(flat, p);
            field.set_velocity(flat, Vec3::ZERO);
        }

        let stepper = GravityStepper::new(0);
        stepper.compute_forces(&mut field);

        let positions = field.positions().to_vec();
        for (i, force) in field.forces().iter().enumerate() {
            let others: Vec3 = positions
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| *p)
                .sum::<Vec3>()
                / (positions.len() - 1) as f32;
            let to_centroid = others - positions[i];

            assert!(force.length() > 0.0);
            assert!(force.dot(to_centroid) > 0.0);
        }
    }

    #[test]
    fn test_gravity_velocity_integrates_force() {
        let mut field = gravity_field(UVec2::new(600, 400), 100);
        let stepper = GravityStepper::new(8);
        stepper.compute_forces(&mut field);

        let before = field.particle(3);
        let force = field.forces()[3];
        let dt = 1.0 / 60.0;
        stepper.step(&mut field, dt, 1);
        let after = field.particle(3);

        if field.grid().contains(after.position) && after.color == before.color {
            let expected_velocity = before.velocity + force * dt;
            assert!((after.velocity - expected_velocity).length() < 1e-3);
            let expected_position = before.position + expected_velocity * dt;
            assert!((after.position - expected_position).length() < 1e-3);
        }
    }
}
