//! Simulation configuration.
//!
//! [`SimConfig`] can be serialized to JSON and loaded by the runner. Every
//! field has a default, so a config file only needs the values it changes.

use crate::error::ConfigError;
use crate::physics::PhysicsParams;
use crate::rng::Mulberry32;
use crate::rules::SparseRules;
use crate::species::{Species, SpeciesRegistry};
use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u32 = 483_297_380;

/// One species in the initial species list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeciesConfig {
    pub name: String,
    /// Display color (RGB, 0.0-1.0).
    pub color: [f32; 3],
}

impl SpeciesConfig {
    pub fn new(name: impl Into<String>, color: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    pub fn to_species(&self) -> Species {
        Species::new(self.name.clone(), Vec3::from_array(self.color))
    }
}

fn default_species() -> Vec<SpeciesConfig> {
    vec![
        SpeciesConfig::new("green", [0.0, 1.0, 0.0]),
        SpeciesConfig::new("red", [1.0, 0.0, 0.0]),
        SpeciesConfig::new("yellow", [1.0, 1.0, 0.0]),
        SpeciesConfig::new("blue", [0.0, 0.0, 1.0]),
    ]
}

fn deserialize_seed<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(Mulberry32::from_f64(raw).seed())
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the rule matrix and particle placement.
    ///
    /// Any JSON number is accepted and mapped with [`Mulberry32::from_f64`],
    /// so seeds persisted as large integers, floats or negatives still load.
    #[serde(deserialize_with = "deserialize_seed")]
    pub seed: u32,
    /// Side length of the simulation cube.
    pub domain_size: f64,
    /// Squared interaction distance.
    pub cutoff: f64,
    /// Force-to-velocity multiplier.
    pub time_scale: f64,
    /// Per-tick velocity damping.
    pub viscosity: f64,
    /// Particles spawned for each species.
    pub particles_per_species: usize,
    /// Rendered particle radius. Ignored by the physics.
    pub particle_radius: f32,
    /// Ticks a click pulse lasts.
    pub pulse_duration: u32,
    /// Initial species, in index order.
    pub species: Vec<SpeciesConfig>,
    /// Fixed starting rules. When absent, rules are drawn from the seed.
    pub rules: Option<SparseRules>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            domain_size: 1000.0,
            cutoff: 40_000.0,
            time_scale: 0.25,
            viscosity: 1.7,
            particles_per_species: 600,
            particle_radius: 0.7,
            pulse_duration: 1,
            species: default_species(),
            rules: None,
        }
    }
}

impl SimConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_particles_per_species(mut self, count: usize) -> Self {
        self.particles_per_species = count;
        self
    }

    pub fn with_species(mut self, species: Vec<SpeciesConfig>) -> Self {
        self.species = species;
        self
    }

    pub fn with_rules(mut self, rules: SparseRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Physics parameters for the integrator.
    pub fn physics(&self) -> PhysicsParams {
        PhysicsParams {
            domain_size: self.domain_size,
            cutoff: self.cutoff,
            time_scale: self.time_scale,
            viscosity: self.viscosity,
        }
    }

    /// Species registry for the configured species list.
    pub fn species_registry(&self) -> Result<SpeciesRegistry, ConfigError> {
        SpeciesRegistry::from_species(self.species.iter().map(SpeciesConfig::to_species))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.domain_size.is_finite() && self.domain_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "domain_size must be a positive number, got {}",
                self.domain_size
            )));
        }
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cutoff must be a positive number, got {}",
                self.cutoff
            )));
        }
        if !self.time_scale.is_finite() {
            return Err(ConfigError::Invalid("time_scale must be finite".into()));
        }
        if !self.viscosity.is_finite() {
            return Err(ConfigError::Invalid("viscosity must be finite".into()));
        }
        if self.species.is_empty() {
            return Err(ConfigError::Invalid("at least one species is required".into()));
        }
        let mut seen = HashSet::new();
        for s in &self.species {
            if s.name.is_empty() {
                return Err(ConfigError::Invalid("species names must not be empty".into()));
            }
            if !seen.insert(s.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate species name: {}",
                    s.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.species.len(), 4);
        assert_eq!(config.species[0].name, "green");
        assert_eq!(config.cutoff, 40_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "seed": 7, "viscosity": 0.5 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.viscosity, 0.5);
        assert_eq!(config.domain_size, 1000.0);
        assert_eq!(config.particles_per_species, 600);
    }

    #[test]
    fn test_persisted_numeric_seeds_are_mapped() {
        let config = SimConfig::from_json(r#"{ "seed": 148624312259077 }"#).unwrap();
        assert_eq!(config.seed, 1_263_948_293);
        assert_eq!(
            Mulberry32::new(config.seed),
            Mulberry32::from_f64(148_624_312_259_077.0)
        );

        let config = SimConfig::from_json(r#"{ "seed": 42.0 }"#).unwrap();
        assert_eq!(config.seed, 42);
        let config = SimConfig::from_json(r#"{ "seed": -1 }"#).unwrap();
        assert_eq!(config.seed, u32::MAX);
        assert!(matches!(
            SimConfig::from_json(r#"{ "seed": "abc" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for json in [
            r#"{ "domain_size": 0.0 }"#,
            r#"{ "cutoff": -1.0 }"#,
            r#"{ "species": [] }"#,
            r#"{ "species": [{ "name": "a", "color": [1, 0, 0] }, { "name": "a", "color": [0, 1, 0] }] }"#,
            r#"{ "species": [{ "name": "", "color": [1, 0, 0] }] }"#,
        ] {
            assert!(
                matches!(SimConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "accepted {json}"
            );
        }
        assert!(matches!(
            SimConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        let mut rules = SparseRules::new();
        rules
            .entry("green".into())
            .or_default()
            .insert("red".into(), -0.5);
        let config = SimConfig::default().with_seed(99).with_rules(rules);
        config.save(&path).unwrap();
        let loaded = SimConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
