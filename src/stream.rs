//! The flat evaluated stream shared by both evaluators
//!
//! A [`TetraStream`] holds one sign bit and one world position per
//! (cell, tetrahedron, slot) sample, laid out as
//! `index = ((i * g + j) * g + k) * 24 + tetra * 4 + slot`. The CPU
//! evaluator fills it directly; the GPU evaluator reads it back from
//! device buffers with the identical layout. The mesh assembler accepts
//! either — it relies only on this positional layout, never on which
//! backend produced it.

use glam::Vec3;

use crate::grid::SLOTS_PER_CELL;
use crate::ExtractError;

/// Per-slot evaluation results for a whole grid.
#[derive(Debug, Clone)]
pub struct TetraStream {
    /// Grid size the stream was evaluated for.
    pub grid_size: usize,
    /// Inside/outside sign per (cell, tetra, slot) sample.
    pub signs: Vec<bool>,
    /// World position per (cell, tetra, slot) sample.
    pub positions: Vec<Vec3>,
}

impl TetraStream {
    /// Allocate an empty stream with exact capacity for `grid_size`.
    pub fn with_capacity(grid_size: usize) -> Self {
        let len = grid_size * grid_size * grid_size * SLOTS_PER_CELL;
        TetraStream {
            grid_size,
            signs: Vec::with_capacity(len),
            positions: Vec::with_capacity(len),
        }
    }

    /// Number of per-slot samples.
    pub fn len(&self) -> usize {
        self.signs.len()
    }

    /// True when the stream holds no samples.
    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }

    /// Number of tetrahedra in the stream.
    pub fn tetra_count(&self) -> usize {
        self.len() / 4
    }

    /// Pack the 4 slot signs starting at `base` into a configuration code.
    ///
    /// Bit `b` is set when slot `b` is inside the field. `base` must be
    /// 4-aligned (the start of a tetrahedron group).
    #[inline]
    pub fn code_at(&self, base: usize) -> u8 {
        debug_assert_eq!(base % 4, 0, "tetra base index must be 4-aligned");
        let mut code = 0u8;
        for slot in 0..4 {
            if self.signs[base + slot] {
                code |= 1 << slot;
            }
        }
        code
    }

    /// Verify the stream is exactly `grid_size³ * 24` samples long.
    ///
    /// A mismatch means an evaluator or a device buffer was sized wrong —
    /// a fatal build error, since a partially-evaluated grid has no
    /// well-defined meaning.
    pub fn check(&self) -> Result<(), ExtractError> {
        let expected = self.grid_size * self.grid_size * self.grid_size * SLOTS_PER_CELL;
        if self.signs.len() != expected || self.positions.len() != expected {
            return Err(ExtractError::StreamSizeMismatch {
                expected,
                signs: self.signs.len(),
                positions: self.positions.len(),
            });
        }
        Ok(())
    }
}
