//! Index-stable species registry.
//!
//! The registry is the single source of truth for which species exist and
//! which index each one occupies. Indices are positions in an ordered list:
//! appending assigns the next index, only the last species can be removed,
//! and renaming never moves a species.

use crate::error::SpeciesError;
use glam::Vec3;

/// A named particle category with its own row and column in the rule matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Species {
    /// Unique display name.
    pub name: String,
    /// Display color (RGB, 0.0-1.0). Not used by the physics.
    pub color: Vec3,
}

impl Species {
    pub fn new(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Ordered list of live species.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpeciesRegistry {
    list: Vec<Species>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered list, rejecting empty or duplicate names.
    pub fn from_species(species: impl IntoIterator<Item = Species>) -> Result<Self, SpeciesError> {
        let mut registry = Self::new();
        for s in species {
            registry.push(s)?;
        }
        Ok(registry)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Species> {
        self.list.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.list.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|s| s.name.as_str())
    }

    /// Index of the species carrying `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.list.iter().position(|s| s.name == name)
    }

    /// Index of `name`, or [`SpeciesError::UnknownSpecies`].
    pub fn require(&self, name: &str) -> Result<usize, SpeciesError> {
        self.index_of(name)
            .ok_or_else(|| SpeciesError::UnknownSpecies(name.to_string()))
    }

    /// Append a species; returns its index.
    pub fn push(&mut self, species: Species) -> Result<usize, SpeciesError> {
        self.check_name(&species.name)?;
        self.list.push(species);
        Ok(self.list.len() - 1)
    }

    /// Remove and return the last species. Refuses when fewer than two remain.
    pub fn pop(&mut self) -> Result<Species, SpeciesError> {
        if self.list.len() < 2 {
            return Err(SpeciesError::LastSpecies);
        }
        self.list.pop().ok_or(SpeciesError::LastSpecies)
    }

    /// Rename a species in place; its index is unchanged.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<(), SpeciesError> {
        let count = self.list.len();
        let current = self
            .list
            .get(index)
            .ok_or(SpeciesError::IndexOutOfRange { index, count })?;
        if current.name == new_name {
            return Ok(());
        }
        self.check_name(new_name)?;
        self.list[index].name = new_name.to_string();
        Ok(())
    }

    pub fn set_color(&mut self, index: usize, color: Vec3) -> Result<(), SpeciesError> {
        let count = self.list.len();
        let species = self
            .list
            .get_mut(index)
            .ok_or(SpeciesError::IndexOutOfRange { index, count })?;
        species.color = color;
        Ok(())
    }

    /// First `color{N}` name not already taken, starting at `N = len + 1`.
    pub fn next_default_name(&self) -> String {
        let mut n = self.list.len() + 1;
        loop {
            let candidate = format!("color{n}");
            if self.index_of(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    fn check_name(&self, name: &str) -> Result<(), SpeciesError> {
        if name.is_empty() {
            return Err(SpeciesError::EmptyName);
        }
        if self.index_of(name).is_some() {
            return Err(SpeciesError::NameTaken(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(names: &[&str]) -> SpeciesRegistry {
        SpeciesRegistry::from_species(names.iter().map(|n| Species::new(*n, Vec3::ONE))).unwrap()
    }

    #[test]
    fn test_push_assigns_next_index() {
        let mut reg = registry(&["green", "red"]);
        let idx = reg.push(Species::new("blue", Vec3::Z)).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(reg.index_of("blue"), Some(2));
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let mut reg = registry(&["green"]);
        assert_eq!(
            reg.push(Species::new("green", Vec3::ONE)),
            Err(SpeciesError::NameTaken("green".into()))
        );
        assert_eq!(reg.push(Species::new("", Vec3::ONE)), Err(SpeciesError::EmptyName));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_pop_refuses_last() {
        let mut reg = registry(&["green", "red"]);
        assert_eq!(reg.pop().unwrap().name, "red");
        assert_eq!(reg.pop(), Err(SpeciesError::LastSpecies));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_rename_keeps_index() {
        let mut reg = registry(&["green", "red", "blue"]);
        reg.rename(1, "crimson").unwrap();
        assert_eq!(reg.index_of("crimson"), Some(1));
        assert_eq!(reg.index_of("red"), None);
        // Same name is a no-op, not a collision.
        reg.rename(1, "crimson").unwrap();
        assert_eq!(
            reg.rename(0, "blue"),
            Err(SpeciesError::NameTaken("blue".into()))
        );
    }

    #[test]
    fn test_next_default_name_skips_taken() {
        let reg = registry(&["color3", "red"]);
        assert_eq!(reg.next_default_name(), "color4");
        let reg = registry(&["a", "color3"]);
        assert_eq!(reg.next_default_name(), "color4");
        let reg = registry(&["a"]);
        assert_eq!(reg.next_default_name(), "color2");
    }
}
