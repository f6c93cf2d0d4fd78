//! Fixed-capacity particle storage keyed by grid coordinate
//!
//! Slots are allocated once and recycled in place: a respawn overwrites the
//! slot, the particle count never changes.

use glam::{UVec3, Vec3};
use rayon::prelude::*;

use crate::particle::{GridSpec, Particle, VelocityInit};
use crate::rng::slot_rng;

/// Mutable view of one slot, handed out by the parallel slot iterator
pub struct SlotMut<'a> {
    pub position: &'a mut Vec3,
    pub velocity: &'a mut Vec3,
    pub force: &'a mut Vec3,
    pub color: &'a mut Vec3,
}

impl SlotMut<'_> {
    /// Overwrite the whole slot with a freshly spawned particle
    pub fn write(&mut self, particle: Particle) {
        *self.position = particle.position;
        *self.velocity = particle.velocity;
        *self.force = Vec3::ZERO;
        *self.color = particle.color;
    }
}

/// Struct-of-arrays particle field over an `Nx × Ny × Nz` grid
#[derive(Debug, Clone)]
pub struct ParticleField {
    grid: GridSpec,
    dims: UVec3,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    forces: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl ParticleField {
    /// Allocate a zeroed field. Call [`ParticleField::spawn_all`] before stepping.
    pub fn new(grid: GridSpec) -> Self {
        let dims = grid.dims();
        let len = (dims.x * dims.y * dims.z) as usize;
        log::debug!("Allocating particle field {}x{}x{} ({} slots)", dims.x, dims.y, dims.z, len);

        Self {
            grid,
            dims,
            positions: vec![Vec3::ZERO; len],
            velocities: vec![Vec3::ZERO; len],
            forces: vec![Vec3::ZERO; len],
            colors: vec![Vec3::ZERO; len],
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Row-major flat slot for a grid coordinate
    pub fn flat_index(&self, index: UVec3) -> usize {
        flatten(self.dims, index)
    }

    /// Grid coordinate of a flat slot
    pub fn grid_index(&self, flat: usize) -> UVec3 {
        unflatten(self.dims, flat)
    }

    /// Every grid coordinate, once, in storage order
    pub fn indices(&self) -> impl Iterator<Item = UVec3> + '_ {
        (0..self.len()).map(move |i| self.grid_index(i))
    }

    /// Visit every particle once
    pub fn for_each<F: FnMut(UVec3, Particle)>(&self, mut f: F) {
        for i in 0..self.len() {
            f(self.grid_index(i), self.particle(i));
        }
    }

    pub fn particle(&self, flat: usize) -> Particle {
        Particle {
            position: self.positions[flat],
            velocity: self.velocities[flat],
            color: self.colors[flat],
        }
    }

    /// Respawn the slot at `index` from `rng`
    pub fn spawn<R: rand::Rng + ?Sized>(&mut self, index: UVec3, velocity: VelocityInit, rng: &mut R) {
        let flat = self.flat_index(index);
        let particle = Particle::spawn(&self.grid, index, velocity, rng);
        self.positions[flat] = particle.position;
        self.velocities[flat] = particle.velocity;
        self.forces[flat] = Vec3::ZERO;
        self.colors[flat] = particle.color;
    }

    /// Spawn every slot in parallel, each from its own seeded stream
    pub fn spawn_all(&mut self, velocity: VelocityInit, seed: u64, tick: u64) {
        let grid = self.grid;
        let dims = self.dims;
        self.par_slots_mut().for_each(|(i, mut slot)| {
            let mut rng = slot_rng(seed, tick, i);
            slot.write(Particle::spawn(&grid, unflatten(dims, i), velocity, &mut rng));
        });
    }

    /// Parallel iterator over `(flat index, slot)` pairs
    pub fn par_slots_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, SlotMut<'_>)> + '_ {
        self.positions
            .par_iter_mut()
            .zip(self.velocities.par_iter_mut())
            .zip(self.forces.par_iter_mut())
            .zip(self.colors.par_iter_mut())
            .map(|(((position, velocity), force), color)| SlotMut {
                position,
                velocity,
                force,
                color,
            })
            .enumerate()
    }

    /// Positions for reading alongside mutable force accumulators
    pub fn positions_and_forces_mut(&mut self) -> (&[Vec3], &mut [Vec3]) {
        (&self.positions, &mut self.forces)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn forces(&self) -> &[Vec3] {
        &self.forces
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn set_position(&mut self, flat: usize, position: Vec3) {
        self.positions[flat] = position;
    }

    pub fn set_velocity(&mut self, flat: usize, velocity: Vec3) {
        self.velocities[flat] = velocity;
    }
}

pub(crate) fn flatten(dims: UVec3, index: UVec3) -> usize {
    debug_assert!(index.cmplt(dims).all(), "grid index {index} out of {dims}");
    ((index.x * dims.y + index.y) * dims.z + index.z) as usize
}

pub(crate) fn unflatten(dims: UVec3, flat: usize) -> UVec3 {
    let flat = flat as u32;
    let z = flat % dims.z;
    let y = (flat / dims.z) % dims.y;
    let x = flat / (dims.z * dims.y);
    UVec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;
    use std::collections::HashSet;

    fn small_field() -> ParticleField {
        // 4 x 3 x 5 cells
        ParticleField::new(GridSpec::new(UVec2::new(400, 300), 200.0, 700.0, 100))
    }

    #[test]
    fn test_index_round_trip_covers_grid() {
        let field = small_field();
        assert_eq!(field.dims(), UVec3::new(4, 3, 5));
        assert_eq!(field.len(), 60);

        let seen: HashSet<_> = field.indices().map(|i| (i.x, i.y, i.z)).collect();
        assert_eq!(seen.len(), field.len());

        for (flat, index) in field.indices().enumerate() {
            assert_eq!(field.flat_index(index), flat);
        }
    }

    #[test]
    fn test_for_each_visits_every_slot_once() {
        let mut field = small_field();
        field.spawn_all(VelocityInit::Zero, 1, 0);

        let mut count = 0;
        field.for_each(|_, _| count += 1);
        assert_eq!(count, field.len());
    }

    #[test]
    fn test_spawn_all_depth_strictly_inside() {
        let mut field = ParticleField::new(GridSpec::new(UVec2::new(1920, 1080), 200.0, 3200.0, 120));
        field.spawn_all(VelocityInit::Zero, 99, 0);

        for p in field.positions() {
            assert!(p.z > 200.0 && p.z < 3200.0, "z = {}", p.z);
        }
    }

    #[test]
    fn test_spawn_all_is_reproducible() {
        let mut a = small_field();
        let mut b = small_field();
        a.spawn_all(VelocityInit::Signed { scale: 50.0 }, 5, 0);
        b.spawn_all(VelocityInit::Signed { scale: 50.0 }, 5, 0);
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
        assert_eq!(a.colors(), b.colors());
    }

    #[test]
    fn test_spawn_overwrites_slot() {
        let mut field = small_field();
        let index = UVec3::new(1, 2, 3);
        let flat = field.flat_index(index);
        field.set_position(flat, Vec3::splat(-1.0));
        field.set_velocity(flat, Vec3::splat(9.0));

        let mut rng = slot_rng(0, 0, flat);
        field.spawn(index, VelocityInit::Zero, &mut rng);

        let p = field.particle(flat);
        assert!(p.position.x > 100.0 && p.position.x < 200.0);
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(field.forces()[flat], Vec3::ZERO);
    }
}
