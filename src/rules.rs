//! Species-by-species affinity rules.
//!
//! The rule matrix defines how strongly each species pushes or pulls on every
//! other species. It is the foundation of "particle life": complex emergent
//! behavior from a small table of signed numbers.
//!
//! [`RuleMatrix`] owns the [`SpeciesRegistry`] and a [`DenseMatrix`] indexed by
//! species index. The dense form is canonical and is the only form the
//! integrator reads. The name-keyed [`SparseRules`] table exists for editors
//! and serialization: [`RuleMatrix::sparse`] produces it and
//! [`RuleMatrix::flatten`] folds an edited table back in.
//!
//! # Example
//!
//! ```
//! use particle_life::rng::Mulberry32;
//! use particle_life::rules::RuleMatrix;
//!
//! let mut rng = Mulberry32::new(42);
//! let mut rules = RuleMatrix::from_names(["green", "red"]).unwrap();
//! rules.randomize(&mut rng);
//! rules.symmetrize();
//! assert_eq!(rules.rule(0, 1), rules.rule(1, 0));
//! ```

use crate::error::SpeciesError;
use crate::events::{Observers, RuleEvent};
use crate::rng::Mulberry32;
use crate::species::{Species, SpeciesRegistry};
use glam::Vec3;
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

/// Name-keyed affinity table: `rules[from][to]`.
pub type SparseRules = BTreeMap<String, BTreeMap<String, f64>>;

/// Clamp an affinity into `[-1, 1]`; non-finite values become 0.
#[inline]
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Square affinity table indexed by species index.
///
/// Flattened row-major: `data[from * size + to]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DenseMatrix {
    /// A `size`×`size` matrix of zeros.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Build from nested rows. Every row must have `rows.len()` entries.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            data: rows.iter().flatten().copied().collect(),
            size,
        })
    }

    /// Number of species (rows and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Affinity of `from` toward `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    #[inline]
    fn set(&mut self, from: usize, to: usize, value: f64) {
        self.data[from * self.size + to] = value;
    }

    /// One row: the affinities of `from` toward every species.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    /// Raw row-major data, e.g. for upload.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Append a zero row and column.
    fn grow(&mut self) {
        let old = self.size;
        let mut next = Self::new(old + 1);
        for from in 0..old {
            next.data[from * (old + 1)..from * (old + 1) + old].copy_from_slice(self.row(from));
        }
        *self = next;
    }

    /// Drop the last row and column.
    fn shrink(&mut self) {
        if self.size == 0 {
            return;
        }
        let new = self.size - 1;
        let mut next = Self::new(new);
        for from in 0..new {
            next.data[from * new..(from + 1) * new].copy_from_slice(&self.row(from)[..new]);
        }
        *self = next;
    }
}

/// Species registry plus the dense affinity matrix.
///
/// Invariant: `dense().size() == species().len()` after every operation.
/// Every mutation fully applies and then notifies subscribers, or is
/// rejected without touching anything.
#[derive(Clone, Debug)]
pub struct RuleMatrix {
    species: SpeciesRegistry,
    dense: DenseMatrix,
    observers: Observers,
}

impl RuleMatrix {
    /// Create a matrix for `species` with every affinity set to 0.
    pub fn new(species: SpeciesRegistry) -> Self {
        let dense = DenseMatrix::new(species.len());
        Self {
            species,
            dense,
            observers: Observers::new(),
        }
    }

    /// Convenience constructor with white display colors.
    pub fn from_names<I, S>(names: I) -> Result<Self, SpeciesError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry =
            SpeciesRegistry::from_species(names.into_iter().map(|n| Species::new(n, Vec3::ONE)))?;
        Ok(Self::new(registry))
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&mut self) -> Receiver<RuleEvent> {
        self.observers.subscribe()
    }

    #[inline]
    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    /// The index-addressed table consulted by the integrator.
    #[inline]
    pub fn dense(&self) -> &DenseMatrix {
        &self.dense
    }

    /// Number of live species.
    #[inline]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Affinity of species `from` toward species `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn rule(&self, from: usize, to: usize) -> f64 {
        self.dense.get(from, to)
    }

    /// Affinity looked up by species names.
    pub fn rule_by_name(&self, from: &str, to: &str) -> Result<f64, SpeciesError> {
        let a = self.species.require(from)?;
        let b = self.species.require(to)?;
        Ok(self.dense.get(a, b))
    }

    /// Redraw every affinity as `draw() * 2 - 1`, outer loop over `from`,
    /// inner loop over `to`, both in species order.
    pub fn randomize(&mut self, rng: &mut Mulberry32) {
        tracing::info!(seed = rng.seed(), species = self.len(), "randomizing rules");
        let n = self.len();
        for from in 0..n {
            for to in 0..n {
                self.dense.set(from, to, rng.draw_signed());
            }
        }
        self.observers.notify(RuleEvent::Randomized);
    }

    /// Make the matrix symmetric.
    ///
    /// For every pair whose names compare `to < from` (string order, not index
    /// order), both directions receive the average of the two.
    pub fn symmetrize(&mut self) {
        let n = self.len();
        for from in 0..n {
            for to in 0..n {
                if self.name(to) < self.name(from) {
                    let v = 0.5 * (self.dense.get(from, to) + self.dense.get(to, from));
                    self.dense.set(from, to, v);
                    self.dense.set(to, from, v);
                }
            }
        }
        tracing::debug!(species = n, "symmetrized rules");
        self.observers.notify(RuleEvent::Symmetrized);
    }

    /// Name-keyed view containing every ordered pair of live species.
    pub fn sparse(&self) -> SparseRules {
        self.species
            .iter()
            .enumerate()
            .map(|(from, a)| {
                let row = self
                    .species
                    .iter()
                    .enumerate()
                    .map(|(to, b)| (b.name.clone(), self.dense.get(from, to)))
                    .collect();
                (a.name.clone(), row)
            })
            .collect()
    }

    /// Rebuild the dense matrix from a name-keyed table in current species order.
    ///
    /// Missing entries become 0; entries for unknown names are ignored; values
    /// are clamped to `[-1, 1]`.
    pub fn flatten(&mut self, sparse: &SparseRules) {
        let n = self.len();
        let mut dense = DenseMatrix::new(n);
        for from in 0..n {
            let Some(row) = sparse.get(self.name(from)) else {
                continue;
            };
            for to in 0..n {
                if let Some(&v) = row.get(self.name(to)) {
                    dense.set(from, to, sanitize(v));
                }
            }
        }
        self.dense = dense;
        self.observers.notify(RuleEvent::Flattened);
    }

    /// Set one affinity by index. The value is clamped to `[-1, 1]`.
    pub fn set_rule(&mut self, from: usize, to: usize, value: f64) -> Result<(), SpeciesError> {
        let count = self.len();
        for index in [from, to] {
            if index >= count {
                return Err(SpeciesError::IndexOutOfRange { index, count });
            }
        }
        let value = sanitize(value);
        self.dense.set(from, to, value);
        self.observers
            .notify(RuleEvent::RuleChanged { from, to, value });
        Ok(())
    }

    /// Set one affinity by species names.
    pub fn set_rule_by_name(&mut self, from: &str, to: &str, value: f64) -> Result<(), SpeciesError> {
        let a = self.species.require(from)?;
        let b = self.species.require(to)?;
        self.set_rule(a, b, value)
    }

    /// Rename `old` to `new`, keeping its index and every affinity.
    ///
    /// Renaming a live species to its own name is a no-op. Renaming onto a
    /// name held by a different live species is refused, since names identify
    /// species.
    pub fn rename_species(&mut self, old: &str, new: &str) -> Result<(), SpeciesError> {
        let index = self.species.require(old)?;
        if old == new {
            return Ok(());
        }
        self.species.rename(index, new)?;
        tracing::debug!(index, old, new, "renamed species");
        self.observers.notify(RuleEvent::SpeciesRenamed {
            index,
            old: old.to_string(),
            new: new.to_string(),
        });
        Ok(())
    }

    /// Change a species' display color.
    pub fn set_species_color(&mut self, index: usize, color: Vec3) -> Result<(), SpeciesError> {
        self.species.set_color(index, color)?;
        self.observers.notify(RuleEvent::SpeciesRecolored { index });
        Ok(())
    }

    /// Append a species and draw its affinities; returns the new index.
    ///
    /// Draw order: first the new species' outgoing row over every species in
    /// order (itself included), then the incoming column from each
    /// pre-existing species in order.
    pub fn add_species(&mut self, species: Species, rng: &mut Mulberry32) -> Result<usize, SpeciesError> {
        let name = species.name.clone();
        let new = self.species.push(species)?;
        self.dense.grow();
        for to in 0..=new {
            self.dense.set(new, to, rng.draw_signed());
        }
        for from in 0..new {
            self.dense.set(from, new, rng.draw_signed());
        }
        tracing::debug!(index = new, name = %name, "added species");
        self.observers
            .notify(RuleEvent::SpeciesAdded { index: new, name });
        Ok(new)
    }

    /// Remove the last species and its row and column.
    ///
    /// Refused with [`SpeciesError::LastSpecies`] when fewer than two species
    /// remain. The caller must drop the particles of the returned index.
    pub fn remove_species(&mut self) -> Result<(usize, Species), SpeciesError> {
        let removed = match self.species.pop() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("cannot remove the last species");
                return Err(e);
            }
        };
        self.dense.shrink();
        let index = self.len();
        tracing::debug!(index, name = %removed.name, "removed species");
        self.observers.notify(RuleEvent::SpeciesRemoved {
            index,
            name: removed.name.clone(),
        });
        Ok((index, removed))
    }

    fn name(&self, index: usize) -> &str {
        self.species
            .get(index)
            .map(|s| s.name.as_str())
            .unwrap_or_default()
    }
}
