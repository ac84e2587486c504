//! Uniform spatial grid for neighbor queries.
//!
//! The cube `[0, domain_size]³` is split into `n³` cubic cells whose edge is at
//! least the interaction radius (`sqrt(cutoff)`), so every particle within
//! range of a query particle lies in the 3×3×3 block around its cell.
//!
//! Particles are bucketed by a counting sort into `sorted_indices`, with
//! `cell_start[c]..cell_end[c]` delimiting cell `c`. Cells are addressed as
//! `cx + cy * n + cz * n * n`. There is no half-cell offset: cell `(0, 0, 0)`
//! starts at the origin. Positions outside the cube clamp to the border cells.
//!
//! The grid is rebuilt from scratch every tick.

use crate::particle::Particle;
use glam::{DVec3, IVec3, UVec3};

/// Largest number of cells per axis. Coarser cells are used beyond this.
pub const MAX_GRID_RESOLUTION: u32 = 128;

/// Offsets for the 27 cells of a 3×3×3 block (including the center).
pub const NEIGHBOR_OFFSETS: [IVec3; 27] = {
    let mut offsets = [IVec3::ZERO; 27];
    let mut i = 0;
    while i < 27 {
        offsets[i] = IVec3::new(
            (i % 3) as i32 - 1,
            ((i / 3) % 3) as i32 - 1,
            (i / 9) as i32 - 1,
        );
        i += 1;
    }
    offsets
};

/// Cell geometry derived from the domain and cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialConfig {
    /// Edge length of each cell in world units.
    pub cell_size: f64,
    /// Number of cells per axis (grid is `grid_resolution³`).
    pub grid_resolution: u32,
}

impl SpatialConfig {
    /// Cells of edge `sqrt(cutoff)`, `ceil(domain_size / cell_size)` per axis.
    ///
    /// The resolution is capped at [`MAX_GRID_RESOLUTION`]; when capped, cells
    /// widen to `domain_size / MAX_GRID_RESOLUTION`, which still covers the
    /// interaction radius. A non-positive cutoff or domain yields a single cell.
    pub fn for_domain(domain_size: f64, cutoff: f64) -> Self {
        let radius = cutoff.max(0.0).sqrt();
        if !(radius > 0.0) || !(domain_size > 0.0) || !domain_size.is_finite() {
            return Self {
                cell_size: domain_size.max(1.0),
                grid_resolution: 1,
            };
        }
        let cells = (domain_size / radius).ceil();
        if cells > MAX_GRID_RESOLUTION as f64 {
            Self {
                cell_size: domain_size / MAX_GRID_RESOLUTION as f64,
                grid_resolution: MAX_GRID_RESOLUTION,
            }
        } else {
            Self {
                cell_size: radius,
                grid_resolution: (cells as u32).max(1),
            }
        }
    }

    /// Total number of cells in the grid.
    pub fn total_cells(&self) -> usize {
        let n = self.grid_resolution as usize;
        n * n * n
    }

    /// Cell coordinates of a position, clamped into the grid.
    #[inline]
    pub fn cell_of(&self, position: DVec3) -> UVec3 {
        let max = (self.grid_resolution - 1) as f64;
        let c = (position / self.cell_size)
            .floor()
            .clamp(DVec3::ZERO, DVec3::splat(max));
        UVec3::new(c.x as u32, c.y as u32, c.z as u32)
    }

    /// Flattened index of a cell.
    #[inline]
    pub fn cell_index(&self, cell: UVec3) -> usize {
        let n = self.grid_resolution as usize;
        cell.x as usize + cell.y as usize * n + cell.z as usize * n * n
    }
}

/// Particle indices bucketed by cell.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    config: SpatialConfig,
    cell_start: Vec<u32>,
    cell_end: Vec<u32>,
    sorted_indices: Vec<u32>,
    particle_cells: Vec<u32>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialGrid {
    /// An empty single-cell grid. Call [`SpatialGrid::rebuild`] before querying.
    pub fn new() -> Self {
        Self {
            config: SpatialConfig {
                cell_size: 1.0,
                grid_resolution: 1,
            },
            cell_start: vec![0],
            cell_end: vec![0],
            sorted_indices: Vec::new(),
            particle_cells: Vec::new(),
        }
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Re-bucket every particle. Buffers are reused between calls.
    pub fn rebuild(&mut self, particles: &[Particle], domain_size: f64, cutoff: f64) {
        let config = SpatialConfig::for_domain(domain_size, cutoff);
        let total = config.total_cells();
        self.config = config;

        self.particle_cells.clear();
        self.particle_cells.extend(
            particles
                .iter()
                .map(|p| config.cell_index(config.cell_of(p.position)) as u32),
        );

        // Histogram into cell_end, exclusive prefix sum into cell_start.
        self.cell_start.clear();
        self.cell_start.resize(total, 0);
        self.cell_end.clear();
        self.cell_end.resize(total, 0);
        for &cell in &self.particle_cells {
            self.cell_end[cell as usize] += 1;
        }
        let mut offset = 0u32;
        for cell in 0..total {
            self.cell_start[cell] = offset;
            offset += self.cell_end[cell];
            self.cell_end[cell] = self.cell_start[cell];
        }

        // Scatter; cell_end advances to its final value.
        self.sorted_indices.clear();
        self.sorted_indices.resize(particles.len(), 0);
        for (i, &cell) in self.particle_cells.iter().enumerate() {
            let slot = &mut self.cell_end[cell as usize];
            self.sorted_indices[*slot as usize] = i as u32;
            *slot += 1;
        }
    }

    /// Cell the particle at `index` was assigned to in the last rebuild.
    pub fn cell_of_particle(&self, index: usize) -> Option<UVec3> {
        let flat = *self.particle_cells.get(index)? as usize;
        let n = self.config.grid_resolution as usize;
        Some(UVec3::new(
            (flat % n) as u32,
            ((flat / n) % n) as u32,
            (flat / (n * n)) as u32,
        ))
    }

    /// Particle indices stored in one cell, or `None` if the cell lies outside
    /// the grid.
    pub fn cell(&self, cell: UVec3) -> Option<&[u32]> {
        if cell.cmpge(UVec3::splat(self.config.grid_resolution)).any() {
            return None;
        }
        Some(self.cell_slice(self.config.cell_index(cell)))
    }

    fn cell_slice(&self, index: usize) -> &[u32] {
        &self.sorted_indices[self.cell_start[index] as usize..self.cell_end[index] as usize]
    }

    /// Every particle index in the 3×3×3 block centered on `cell`.
    ///
    /// Offsets that fall outside the grid are skipped; there is no wraparound.
    pub fn neighbors(&self, cell: UVec3) -> impl Iterator<Item = usize> + '_ {
        let n = self.config.grid_resolution as i32;
        let center = cell.as_ivec3();
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |offset| center + *offset)
            .filter(move |c| c.cmpge(IVec3::ZERO).all() && c.cmplt(IVec3::splat(n)).all())
            .flat_map(move |c| {
                self.cell_slice(self.config.cell_index(c.as_uvec3()))
                    .iter()
                    .map(|&i| i as usize)
            })
    }

    /// Neighbors of the particle at `index` (including itself).
    pub fn neighbors_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.cell_of_particle(index)
            .into_iter()
            .flat_map(move |cell| self.neighbors(cell))
    }
}
