//! One simulation tick: neighbor forces, damping, integration, walls.
//!
//! For each particle `i` of species `a`, every other particle `j` of species
//! `b` within the squared cutoff contributes
//!
//! ```text
//! f += dense[a][b] / |Pi - Pj| * (Pi - Pj)
//! ```
//!
//! Velocities are then damped and accelerated
//! (`v = v * (1 - viscosity) + f * time_scale`) for *all* particles before any
//! position moves, so every force sees the same snapshot of positions.
//! Positions advance by the new velocity and reflect once off each wall.

use crate::particle::Particle;
use crate::rules::DenseMatrix;
use crate::spatial::SpatialGrid;
use glam::{DVec2, DVec3};

/// Parameters for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    /// Side length of the cube `[0, domain_size]³`.
    pub domain_size: f64,
    /// Squared interaction distance.
    pub cutoff: f64,
    /// Force-to-velocity multiplier.
    pub time_scale: f64,
    /// Per-tick damping. Above 1 the velocity partially inverts each tick.
    pub viscosity: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            domain_size: 1000.0,
            cutoff: 40_000.0,
            time_scale: 0.25,
            viscosity: 1.7,
        }
    }
}

/// Short planar push or pull centered on a point (a "click pulse").
///
/// Adds `100 * strength / (d2 * time_scale) * (P.xy - center)` to each
/// particle's force, where `d2` is the planar squared distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub center: DVec2,
    pub strength: f64,
}

impl Pulse {
    #[inline]
    fn force(&self, position: DVec3, time_scale: f64) -> DVec3 {
        let d = position.truncate() - self.center;
        let d2 = d.length_squared();
        if d2 > 0.0 {
            let f = (100.0 * self.strength) / (d2 * time_scale);
            (d * f).extend(0.0)
        } else {
            DVec3::ZERO
        }
    }
}

/// Reflect one coordinate off the walls at 0 and `size`, flipping velocity.
///
/// Single reflection only: a particle faster than `size` per tick may remain
/// outside the cube.
#[inline]
pub fn reflect(position: &mut f64, velocity: &mut f64, size: f64) {
    if *position < 0.0 {
        *position = -*position;
        *velocity = -*velocity;
    } else if *position >= size {
        *position = 2.0 * size - *position;
        *velocity = -*velocity;
    }
}

/// Owns the per-tick scratch state (the grid and force buffer).
#[derive(Clone, Debug, Default)]
pub struct Integrator {
    grid: SpatialGrid,
    forces: Vec<DVec3>,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid as of the last tick.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Forces accumulated in the last tick, one per particle.
    pub fn forces(&self) -> &[DVec3] {
        &self.forces
    }

    /// Advance every particle by one tick.
    ///
    /// Returns the mean of `|vx| + |vy| + |vz|` over all particles after the
    /// velocity update. With no particles the mean is `0 / 0`, i.e. NaN;
    /// callers are expected to skip empty stores.
    ///
    /// Every particle's species must be a valid index into `rules`.
    pub fn step(
        &mut self,
        particles: &mut [Particle],
        rules: &DenseMatrix,
        params: &PhysicsParams,
        pulse: Option<&Pulse>,
    ) -> f64 {
        self.grid
            .rebuild(particles, params.domain_size, params.cutoff);
        self.accumulate_forces(particles, rules, params.cutoff);

        if let Some(pulse) = pulse.filter(|p| p.strength != 0.0) {
            for (force, p) in self.forces.iter_mut().zip(particles.iter()) {
                *force += pulse.force(p.position, params.time_scale);
            }
        }

        let damping = 1.0 - params.viscosity;
        let mut activity = 0.0;
        for (p, force) in particles.iter_mut().zip(&self.forces) {
            p.velocity = p.velocity * damping + *force * params.time_scale;
            activity += p.velocity.abs().element_sum();
        }

        for p in particles.iter_mut() {
            p.position += p.velocity;
            reflect(&mut p.position.x, &mut p.velocity.x, params.domain_size);
            reflect(&mut p.position.y, &mut p.velocity.y, params.domain_size);
            reflect(&mut p.position.z, &mut p.velocity.z, params.domain_size);
        }

        activity / particles.len() as f64
    }

    fn accumulate_forces(&mut self, particles: &[Particle], rules: &DenseMatrix, cutoff: f64) {
        self.forces.clear();
        self.forces.resize(particles.len(), DVec3::ZERO);
        for (i, a) in particles.iter().enumerate() {
            let Some(cell) = self.grid.cell_of_particle(i) else {
                continue;
            };
            let row = rules.row(a.species_index());
            let mut force = DVec3::ZERO;
            for j in self.grid.neighbors(cell) {
                if j == i {
                    continue;
                }
                let b = &particles[j];
                let d = a.position - b.position;
                let d2 = d.length_squared();
                if d2 < cutoff && d2 > 0.0 {
                    let g = row[b.species_index()];
                    let inv_dist = 1.0 / d2.sqrt();
                    force += d * (g * inv_dist);
                }
            }
            self.forces[i] = force;
        }
    }
}
