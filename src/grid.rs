//! Voxel grid configuration and cell geometry
//!
//! A grid is `grid_size³` cubic cells centered on an origin transform.
//! Cell `(i, j, k)` sits at integer lattice position `index - grid_size/2`
//! (integer half-grid centering) and maps to world space through
//! `origin + rotation * (cell_size * local)`. The mapping is rigid, so
//! cell shape and adjacency are preserved across the whole grid.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::tables::CORNER_OFFSETS;
use crate::ExtractError;

/// Number of tetrahedra per cell.
pub const TETRA_PER_CELL: usize = 6;

/// Number of (tetrahedron, slot) samples per cell: 6 tetrahedra x 4 slots.
pub const SLOTS_PER_CELL: usize = 24;

/// Immutable description of one extraction grid.
///
/// Passed by reference into the evaluators; a build never mutates it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of cells along each axis.
    pub grid_size: usize,
    /// World-space edge length of one cell. Must be positive and finite.
    pub cell_size: f32,
    /// World-space position of the grid center.
    pub origin: Vec3,
    /// World-space orientation of the grid.
    pub rotation: Quat,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            grid_size: 5,
            cell_size: 1.0,
            origin: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl GridConfig {
    /// Check the configuration before a build starts.
    ///
    /// Invalid values abort the build before any evaluator runs.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.grid_size == 0 {
            return Err(ExtractError::InvalidGridSize(self.grid_size));
        }
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            return Err(ExtractError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    /// Total number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size * self.grid_size
    }

    /// Total number of per-slot samples: `grid_size³ * 24`.
    ///
    /// Both evaluators produce streams of exactly this length; the GPU
    /// path also sizes its device buffers from it.
    pub fn slot_count(&self) -> usize {
        self.cell_count() * SLOTS_PER_CELL
    }

    /// World-space center of cell `(i, j, k)`.
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> Vec3 {
        let half = (self.grid_size / 2) as i64;
        let local = Vec3::new(
            (i as i64 - half) as f32,
            (j as i64 - half) as f32,
            (k as i64 - half) as f32,
        );
        self.origin + self.rotation * (self.cell_size * local)
    }

    /// World-space positions of the 8 corners of cell `(i, j, k)`.
    ///
    /// Pure function of the config and index; corners are derived on
    /// demand, never stored. The enumeration is the fixed order of
    /// [`CORNER_OFFSETS`] and must match the GPU kernel bit-for-bit.
    pub fn cell_corners(&self, i: usize, j: usize, k: usize) -> [Vec3; 8] {
        let center = self.cell_center(i, j, k);
        let half_cell = self.cell_size * 0.5;
        core::array::from_fn(|c| {
            let [ox, oy, oz] = CORNER_OFFSETS[c];
            let offset = Vec3::new(ox as f32, oy as f32, oz as f32) * half_cell;
            center + self.rotation * offset
        })
    }
}

/// Midpoint of two corner positions.
///
/// The zero crossing is always approximated at factor 0.5 rather than by
/// field magnitude (the field is boolean, there is no magnitude to lerp
/// by), so surfaces are blocky unless the grid is fine relative to
/// feature size. Known fidelity limit, not a bug.
#[inline]
pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_grid_size_is_rejected() {
        let config = GridConfig {
            grid_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidGridSize(0))
        ));
    }

    #[test]
    fn non_positive_cell_size_is_rejected() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = GridConfig {
                cell_size: bad,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ExtractError::InvalidCellSize(_))),
                "cell_size {bad} should be rejected"
            );
        }
    }

    #[test]
    fn center_cell_sits_on_origin() {
        let config = GridConfig::default(); // grid_size 5, half 2
        assert_eq!(config.cell_center(2, 2, 2), Vec3::ZERO);
        assert_eq!(config.cell_center(0, 2, 2), Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(config.cell_center(4, 2, 2), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn corners_follow_the_fixed_enumeration() {
        let config = GridConfig::default();
        let corners = config.cell_corners(2, 2, 2);
        assert_eq!(corners[0], Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(corners[1], Vec3::new(-0.5, -0.5, 0.5));
        assert_eq!(corners[2], Vec3::new(0.5, -0.5, 0.5));
        assert_eq!(corners[6], Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(corners[7], Vec3::new(0.5, 0.5, -0.5));
    }

    #[test]
    fn adjacent_cells_share_corner_positions() {
        // corner 2 of a cell coincides with corner 1 of its +X neighbor
        let config = GridConfig::default();
        let a = config.cell_corners(1, 2, 2);
        let b = config.cell_corners(2, 2, 2);
        assert_eq!(a[2], b[1]);
        assert_eq!(a[3], b[0]);
    }

    #[test]
    fn rotation_preserves_cell_shape() {
        let rotated = GridConfig {
            rotation: Quat::from_rotation_y(0.7),
            ..Default::default()
        };
        let reference = GridConfig::default();
        let a = rotated.cell_corners(1, 3, 2);
        let b = reference.cell_corners(1, 3, 2);
        // pairwise distances survive the rigid transform
        for i in 0..8 {
            for j in (i + 1)..8 {
                let da = a[i].distance(a[j]);
                let db = b[i].distance(b[j]);
                assert!((da - db).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn midpoint_halves_the_edge() {
        let m = midpoint(Vec3::new(1.0, 0.0, -2.0), Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(m, Vec3::new(2.0, 2.0, 0.0));
    }
}
