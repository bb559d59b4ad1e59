//! CPU grid evaluator
//!
//! The reference evaluation path: strictly sequential, no shared mutable
//! state, a pure batch function of the grid configuration and the sign
//! field. Iterates cells in row-major `(i, j, k)` order, then tetrahedra
//! 0..6, then slots 0..4 — the positional order the mesh assembler
//! depends on.

use crate::field::SignField;
use crate::grid::{GridConfig, TETRA_PER_CELL};
use crate::stream::TetraStream;
use crate::tables::TETRA_TO_CORNER;
use crate::ExtractError;

/// Evaluate the sign field over every tetrahedron slot of the grid.
///
/// Samples the field once per referenced corner per tetrahedron (by
/// corner index, not deduplicated across the tetrahedra sharing that
/// corner — the field is pure, so the redundancy costs time, not
/// correctness). Returns the flat stream consumed by
/// [`assemble`](crate::assemble::assemble).
pub fn evaluate<F: SignField>(
    config: &GridConfig,
    field: &F,
) -> Result<TetraStream, ExtractError> {
    config.validate()?;

    let g = config.grid_size;
    let mut stream = TetraStream::with_capacity(g);

    for i in 0..g {
        for j in 0..g {
            for k in 0..g {
                let corners = config.cell_corners(i, j, k);
                for tetra in 0..TETRA_PER_CELL {
                    for slot in 0..4 {
                        let p = corners[TETRA_TO_CORNER[tetra][slot]];
                        stream.positions.push(p);
                        stream.signs.push(field.contains(p));
                    }
                }
            }
        }
    }

    stream.check()?;
    Ok(stream)
}
