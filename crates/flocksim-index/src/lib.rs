//! Spatial hashing for per-tick flock neighborhood cells.
//!
//! Agents are bucketed by the integer grid cell containing their position;
//! all agents sharing a cell key form one "cell" for aggregation purposes.
//! Key collisions between distant grid coordinates are tolerated: cell
//! equivalence is defined by key equality, nothing more.

use dashmap::DashMap;
use glam::{IVec3, Vec3};
use thiserror::Error;

/// Errors emitted by spatial hash construction.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive cell radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Maps world positions to integer grid cells of a fixed edge length.
#[derive(Debug, Clone, Copy)]
pub struct SpatialHash {
    cell_radius: f32,
}

impl SpatialHash {
    /// Create a hasher for cells of the given edge length.
    pub fn new(cell_radius: f32) -> Result<Self, IndexError> {
        if !cell_radius.is_finite() || cell_radius <= 0.0 {
            return Err(IndexError::InvalidConfig("cell radius must be positive"));
        }
        Ok(Self { cell_radius })
    }

    /// Edge length of each grid cell.
    #[must_use]
    pub fn cell_radius(&self) -> f32 {
        self.cell_radius
    }

    /// Integer grid coordinate containing `position`.
    #[must_use]
    pub fn coord(&self, position: Vec3) -> IVec3 {
        (position / self.cell_radius).floor().as_ivec3()
    }

    /// Hashed cell key for `position`.
    #[must_use]
    pub fn key(&self, position: Vec3) -> i32 {
        hash_coord(self.coord(position))
    }
}

/// Mix an integer grid coordinate into a single cell key.
#[must_use]
pub fn hash_coord(coord: IVec3) -> i32 {
    let mut h = (coord.x as u32).wrapping_mul(0x9E37_79B1);
    h ^= (coord.y as u32).wrapping_mul(0x85EB_CA77);
    h ^= (coord.z as u32).wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h as i32
}

/// Concurrent multi-valued map from cell key to member indices.
///
/// Insertion is safe from multiple parallel workers under shared access; no
/// entry is lost or duplicated. There is no ordering guarantee among members
/// of a cell.
#[derive(Debug, Default)]
pub struct CellMap {
    cells: DashMap<i32, Vec<u32>>,
}

impl CellMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `member` to the cell at `key`.
    pub fn insert(&self, key: i32, member: u32) {
        self.cells.entry(key).or_default().push(member);
    }

    /// Number of populated cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell holds any member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total members across all cells.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.cells.iter().map(|entry| entry.value().len()).sum()
    }

    /// Move every populated cell's member list into `out`, leaving the map
    /// empty with its shard tables retained for reuse.
    pub fn drain_cells(&self, out: &mut Vec<Vec<u32>>) {
        out.clear();
        for mut entry in self.cells.iter_mut() {
            out.push(std::mem::take(entry.value_mut()));
        }
        self.cells.clear();
    }
}
