//! Error types for the particle life core.
//!
//! Species mutations report refusals through [`SpeciesError`]; nothing in the
//! core panics on a rejected request, and a refused mutation leaves the rule
//! matrix and particle store exactly as they were.

use thiserror::Error;

/// Errors returned by species and rule-matrix mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeciesError {
    /// Removing the only remaining species is refused.
    #[error("cannot remove the last remaining species")]
    LastSpecies,
    /// No live species carries this name.
    #[error("unknown species: {0}")]
    UnknownSpecies(String),
    /// Another live species already carries this name.
    #[error("species name already in use: {0}")]
    NameTaken(String),
    /// Species names must be non-empty.
    #[error("species name must not be empty")]
    EmptyName,
    /// A species index outside the live range.
    #[error("species index {index} out of range (species count {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Errors that can occur while loading, saving or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid config JSON.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is outside its accepted range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
