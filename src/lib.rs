//! # Particle Life
//!
//! A particle life simulation core: point particles, each tagged with a
//! species, move under pairwise attraction and repulsion set by a
//! species-by-species affinity matrix.
//!
//! The crate handles the simulation only. Rendering, widgets and input live in
//! the host application, which reads particle and rule state and drives the
//! tick loop.
//!
//! ## Quick Start
//!
//! ```
//! use particle_life::prelude::*;
//!
//! let config = SimConfig::default()
//!     .with_seed(42)
//!     .with_particles_per_species(50);
//! let mut sim = Simulation::new(config).unwrap();
//!
//! let events = sim.subscribe();
//! sim.symmetrize_rules();
//! assert_eq!(events.try_recv(), Ok(RuleEvent::Symmetrized));
//!
//! let activity = sim.step().unwrap();
//! assert!(activity.is_finite());
//! ```
//!
//! ## Core Concepts
//!
//! ### Species and rules
//!
//! [`RuleMatrix`] owns the ordered species list and a dense matrix where
//! `rule(a, b)` is the affinity of species `a` toward species `b`, in
//! `[-1, 1]`. The relation is asymmetric unless [`RuleMatrix::symmetrize`] is
//! called. Species can be added, renamed, and removed (last one only) at
//! runtime; every mutation keeps the matrix square and complete.
//!
//! ### Forces
//!
//! Each tick, a particle at `P` feels `g / |P - Q| * (P - Q)` from every other
//! particle at `Q` within the cutoff, where `g` is the affinity between their
//! species. A [`SpatialGrid`] restricts the search to neighboring cells.
//!
//! ### Reproducibility
//!
//! All randomness flows through one [`Mulberry32`] stream, so sharing the
//! seed reproduces the rules and the initial particle placement exactly.
//!
//! ## Feature Overview
//!
//! | Area | Types |
//! |------|-------|
//! | Randomness | [`Mulberry32`] |
//! | Rules | [`RuleMatrix`], [`DenseMatrix`], [`SparseRules`], [`RuleEvent`] |
//! | Particles | [`Particle`], [`ParticleStore`] |
//! | Physics | [`SpatialGrid`], [`Integrator`], [`PhysicsParams`], [`Pulse`] |
//! | Driving | [`Simulation`], [`SimConfig`], [`Time`] |

pub mod config;
pub mod error;
pub mod events;
pub mod particle;
pub mod physics;
pub mod rng;
pub mod rules;
pub mod simulation;
pub mod spatial;
pub mod species;
pub mod time;

pub use bytemuck;
pub use config::{SimConfig, SpeciesConfig};
pub use error::{ConfigError, SpeciesError};
pub use events::RuleEvent;
pub use glam::{DVec2, DVec3, Vec3};
pub use particle::{Particle, ParticleStore};
pub use physics::{Integrator, PhysicsParams, Pulse};
pub use rng::Mulberry32;
pub use rules::{DenseMatrix, RuleMatrix, SparseRules};
pub use simulation::Simulation;
pub use spatial::{SpatialConfig, SpatialGrid};
pub use species::{Species, SpeciesRegistry};
pub use time::Time;

/// Convenient re-exports for common usage.
///
/// ```
/// use particle_life::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{SimConfig, SpeciesConfig};
    pub use crate::error::{ConfigError, SpeciesError};
    pub use crate::events::RuleEvent;
    pub use crate::particle::{Particle, ParticleStore};
    pub use crate::physics::{Integrator, PhysicsParams, Pulse};
    pub use crate::rng::Mulberry32;
    pub use crate::rules::{DenseMatrix, RuleMatrix, SparseRules};
    pub use crate::simulation::Simulation;
    pub use crate::species::{Species, SpeciesRegistry};
    pub use crate::time::Time;
    pub use crate::{DVec2, DVec3, Vec3};
}
