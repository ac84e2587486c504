//! Particles and the store that owns them.
//!
//! [`Particle`] has a fixed `#[repr(C)]` layout so a renderer can upload
//! [`ParticleStore::as_bytes`] directly as an instance buffer.

use crate::rng::Mulberry32;
use bytemuck::{Pod, Zeroable};
use glam::DVec3;

/// Distance kept between freshly spawned particles and each wall.
const SPAWN_MARGIN: f64 = 50.0;

/// A point particle.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position, nominally inside `[0, domain_size]³`.
    pub position: DVec3,
    /// Displacement applied per tick.
    pub velocity: DVec3,
    /// Index of the particle's species in the rule matrix.
    pub species: u32,
    _pad: u32,
}

impl Particle {
    pub fn new(position: DVec3, velocity: DVec3, species: u32) -> Self {
        Self {
            position,
            velocity,
            species,
            _pad: 0,
        }
    }

    /// A particle at rest.
    pub fn at_rest(position: DVec3, species: u32) -> Self {
        Self::new(position, DVec3::ZERO, species)
    }

    #[inline]
    pub fn species_index(&self) -> usize {
        self.species as usize
    }
}

/// Owns every live particle.
#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Particle data as raw bytes for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Number of particles of one species.
    pub fn count_of(&self, species: usize) -> usize {
        self.particles
            .iter()
            .filter(|p| p.species_index() == species)
            .count()
    }

    /// Spawn `count` resting particles of `species` at random positions.
    ///
    /// Each particle draws x, y then z as `draw() * (domain - 100) + 50`; for
    /// domains of 100 or less the margin is dropped and the full cube is used.
    pub fn spawn(&mut self, count: usize, species: usize, domain_size: f64, rng: &mut Mulberry32) {
        let (span, margin) = if domain_size > 2.0 * SPAWN_MARGIN {
            (domain_size - 2.0 * SPAWN_MARGIN, SPAWN_MARGIN)
        } else {
            (domain_size, 0.0)
        };
        self.particles.reserve(count);
        for _ in 0..count {
            let x = rng.draw() * span + margin;
            let y = rng.draw() * span + margin;
            let z = rng.draw() * span + margin;
            self.particles
                .push(Particle::at_rest(DVec3::new(x, y, z), species as u32));
        }
    }

    /// Replace every particle with `per_species` fresh particles for each of
    /// `species_count` species, spawned in species order.
    pub fn repopulate(
        &mut self,
        per_species: usize,
        species_count: usize,
        domain_size: f64,
        rng: &mut Mulberry32,
    ) {
        self.particles.clear();
        for species in 0..species_count {
            self.spawn(per_species, species, domain_size, rng);
        }
        tracing::debug!(particles = self.len(), species_count, "repopulated particles");
    }

    /// Drop every particle of `species`; returns how many were removed.
    pub fn remove_species(&mut self, species: usize) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| p.species_index() != species);
        before - self.particles.len()
    }
}
