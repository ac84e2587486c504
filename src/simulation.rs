//! Simulation context and tick driver.
//!
//! [`Simulation`] owns every piece of simulation state: the seeded generator,
//! the rule matrix, the particle store, the integrator scratch state and the
//! frame clock. A presentation layer drives it by calling [`Simulation::step`]
//! once per frame and routes user actions to the mutation methods.

use crate::config::SimConfig;
use crate::error::{ConfigError, SpeciesError};
use crate::events::RuleEvent;
use crate::particle::ParticleStore;
use crate::physics::{Integrator, PhysicsParams, Pulse};
use crate::rng::Mulberry32;
use crate::rules::{RuleMatrix, SparseRules};
use crate::species::Species;
use crate::time::Time;
use glam::{DVec2, Vec3};
use rand::Rng;
use std::sync::mpsc::Receiver;

/// Activity above which a large time scale is reduced.
const ACTIVITY_LIMIT: f64 = 30.0;
/// Time scale above which high activity triggers a reduction.
const TIME_SCALE_LIMIT: f64 = 5.0;
/// Divisor applied to the time scale per damped tick.
const TIME_SCALE_DECAY: f64 = 1.1;

/// A running particle life simulation.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    rng: Mulberry32,
    rules: RuleMatrix,
    particles: ParticleStore,
    integrator: Integrator,
    time: Time,
    pulse: Option<Pulse>,
    last_activity: Option<f64>,
}

impl Simulation {
    /// Build a simulation from a validated config.
    ///
    /// Rules come from `config.rules` when present, otherwise they are drawn
    /// from the seed. Particles are then spawned from the same stream.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Mulberry32::new(config.seed);
        tracing::info!(seed = config.seed, "using seed");

        let mut rules = RuleMatrix::new(config.species_registry()?);
        match &config.rules {
            Some(preset) => rules.flatten(preset),
            None => rules.randomize(&mut rng),
        }

        let mut particles = ParticleStore::new();
        particles.repopulate(
            config.particles_per_species,
            rules.len(),
            config.domain_size,
            &mut rng,
        );

        Ok(Self {
            config,
            rng,
            rules,
            particles,
            integrator: Integrator::new(),
            time: Time::new(),
            pulse: None,
            last_activity: None,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn physics(&self) -> PhysicsParams {
        self.config.physics()
    }

    pub fn rules(&self) -> &RuleMatrix {
        &self.rules
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    /// Current generator state, suitable for sharing and [`Simulation::reseed`].
    pub fn seed(&self) -> u32 {
        self.rng.seed()
    }

    /// Activity returned by the most recent non-empty tick.
    pub fn last_activity(&self) -> Option<f64> {
        self.last_activity
    }

    /// Subscribe to rule-matrix change notifications.
    pub fn subscribe(&mut self) -> Receiver<RuleEvent> {
        self.rules.subscribe()
    }

    /// Advance one tick.
    ///
    /// Returns the activity metric, or `None` without touching any state when
    /// the simulation is paused or there are no particles. Afterwards the time
    /// scale adapts to activity and an active pulse counts down.
    pub fn step(&mut self) -> Option<f64> {
        if self.time.is_paused() || self.particles.is_empty() {
            return None;
        }
        let params = self.config.physics();
        let activity = self.integrator.step(
            self.particles.as_mut_slice(),
            self.rules.dense(),
            &params,
            self.pulse.as_ref(),
        );
        self.time.update();
        self.adapt_time_scale(activity);
        self.decay_pulse();
        self.last_activity = Some(activity);
        Some(activity)
    }

    fn adapt_time_scale(&mut self, activity: f64) {
        if activity > ACTIVITY_LIMIT && self.config.time_scale > TIME_SCALE_LIMIT {
            self.config.time_scale /= TIME_SCALE_DECAY;
            tracing::debug!(
                activity,
                time_scale = self.config.time_scale,
                "reduced time scale"
            );
        }
    }

    fn decay_pulse(&mut self) {
        if let Some(pulse) = &mut self.pulse {
            if pulse.strength > 0.0 {
                pulse.strength -= 1.0;
            }
            if pulse.strength == 0.0 {
                self.pulse = None;
            }
        }
    }

    /// Arm a pulse at `(x, y)` lasting `pulse_duration` ticks.
    pub fn trigger_pulse(&mut self, x: f64, y: f64) {
        self.pulse = Some(Pulse {
            center: DVec2::new(x, y),
            strength: self.config.pulse_duration as f64,
        });
    }

    pub fn pulse(&self) -> Option<&Pulse> {
        self.pulse.as_ref()
    }

    /// Respawn every particle at the current species count.
    pub fn reset(&mut self) {
        self.particles.repopulate(
            self.config.particles_per_species,
            self.rules.len(),
            self.config.domain_size,
            &mut self.rng,
        );
        self.last_activity = None;
    }

    /// Replace the generator state. Nothing else changes until the next draw.
    pub fn reseed(&mut self, seed: u32) {
        tracing::info!(seed, "reseeding");
        self.rng.reseed(seed);
    }

    /// Redraw every rule from the seed, then respawn particles.
    pub fn randomize_rules(&mut self) {
        self.rules.randomize(&mut self.rng);
        self.reset();
    }

    /// Symmetrize the rules, then respawn particles.
    pub fn symmetrize_rules(&mut self) {
        self.rules.symmetrize();
        self.reset();
    }

    /// Replace the rules from a name-keyed table.
    pub fn load_rules(&mut self, sparse: &SparseRules) {
        self.rules.flatten(sparse);
    }

    pub fn set_rule(&mut self, from: usize, to: usize, value: f64) -> Result<(), SpeciesError> {
        self.rules.set_rule(from, to, value)
    }

    pub fn rename_species(&mut self, old: &str, new: &str) -> Result<(), SpeciesError> {
        self.rules.rename_species(old, new)
    }

    pub fn set_species_color(&mut self, index: usize, color: Vec3) -> Result<(), SpeciesError> {
        self.rules.set_species_color(index, color)
    }

    /// Add a species with a generated name and random color, then spawn
    /// `count` particles of it. Returns the new species index.
    pub fn add_species(&mut self, count: usize) -> Result<usize, SpeciesError> {
        let name = self.rules.species().next_default_name();
        // Display colors come from an unseeded source so they never shift the
        // seeded stream.
        let mut color_rng = rand::thread_rng();
        let color = Vec3::new(color_rng.gen(), color_rng.gen(), color_rng.gen());
        self.add_named_species(Species::new(name, color), count)
    }

    /// Add a specific species and spawn `count` particles of it.
    pub fn add_named_species(&mut self, species: Species, count: usize) -> Result<usize, SpeciesError> {
        let index = self.rules.add_species(species, &mut self.rng)?;
        self.particles
            .spawn(count, index, self.config.domain_size, &mut self.rng);
        Ok(index)
    }

    /// Remove the last species together with all of its particles.
    ///
    /// Refused with [`SpeciesError::LastSpecies`] when only one species is
    /// left, in which case nothing changes.
    pub fn remove_species(&mut self) -> Result<Species, SpeciesError> {
        let (index, removed) = self.rules.remove_species()?;
        let dropped = self.particles.remove_species(index);
        tracing::debug!(index, dropped, "removed species particles");
        Ok(removed)
    }

    /// Change the per-species particle count and respawn.
    pub fn set_particles_per_species(&mut self, count: usize) {
        self.config.particles_per_species = count;
        self.reset();
    }

    /// Change the cube size and respawn.
    pub fn set_domain_size(&mut self, domain_size: f64) -> Result<(), ConfigError> {
        if !(domain_size.is_finite() && domain_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "domain_size must be a positive number, got {domain_size}"
            )));
        }
        self.config.domain_size = domain_size;
        self.reset();
        Ok(())
    }

    pub fn set_cutoff(&mut self, cutoff: f64) -> Result<(), ConfigError> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cutoff must be a positive number, got {cutoff}"
            )));
        }
        self.config.cutoff = cutoff;
        Ok(())
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        if time_scale.is_finite() {
            self.config.time_scale = time_scale;
        }
    }

    pub fn set_viscosity(&mut self, viscosity: f64) {
        if viscosity.is_finite() {
            self.config.viscosity = viscosity;
        }
    }

    pub fn set_pulse_duration(&mut self, ticks: u32) {
        self.config.pulse_duration = ticks;
    }

    /// Freeze the simulation; [`Simulation::step`] is a no-op until resumed.
    pub fn pause(&mut self) {
        self.time.pause();
    }

    pub fn is_paused(&self) -> bool {
        self.time.is_paused()
    }

    pub fn resume(&mut self) {
        self.time.resume();
    }
}
