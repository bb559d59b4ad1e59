//! Triangulation lookup tables for the 6-tetrahedra cell decomposition
//!
//! Each cubic cell is split into six tetrahedra sharing the 1-7 body
//! diagonal. A tetrahedron's 4-bit sign configuration (bit `b` set when
//! local vertex slot `b` is inside the field) indexes into two tables:
//! which edge midpoints become mesh vertices, and how those vertices are
//! stitched into triangles with outward winding.
//!
//! Complementary codes `c` and `15 - c` cut the tetrahedron along the same
//! edge set, so the edge table stores only the 8 canonical rows; the
//! triangle table keeps all 16 rows because the winding flips between the
//! two sides.

/// Maps each of the 6 tetrahedra to the 4 cube corners it references.
///
/// Every tetrahedron contains corners 1 and 7 (the shared body diagonal)
/// in its last two slots. This mapping is identical for every cell and
/// must match the copy the GPU kernel reads from its lookup buffer.
pub const TETRA_TO_CORNER: [[usize; 4]; 6] = [
    [5, 4, 1, 7],
    [6, 5, 1, 7],
    [4, 0, 1, 7],
    [2, 6, 1, 7],
    [0, 3, 1, 7],
    [3, 2, 1, 7],
];

/// Signed unit offsets from a cell center to each of its 8 corners.
///
/// Corners 0-3 form the bottom face, clockwise from the -X/-Z corner when
/// viewed from above; corners 4-7 repeat the order on the top face.
pub const CORNER_OFFSETS: [[i32; 3]; 8] = [
    [-1, -1, -1], // 0
    [-1, -1, 1],  // 1
    [1, -1, 1],   // 2
    [1, -1, -1],  // 3
    [-1, 1, -1],  // 4
    [-1, 1, 1],   // 5
    [1, 1, 1],    // 6
    [1, 1, -1],   // 7
];

/// Edge midpoints to emit per canonical configuration, as local slot pairs.
///
/// Indexed by `canonical_code(code)`. Each `(a, b)` pair emits one vertex
/// at the midpoint of the edge between local slots `a` and `b`. Rows hold
/// 0 pairs (trivial), 3 pairs (single triangle) or 4 pairs (quad).
pub const CONFIG_TO_EDGES: [&[(usize, usize)]; 8] = [
    &[],                                     // 0, 15
    &[(0, 1), (0, 2), (0, 3)],               // 1, 14
    &[(1, 0), (1, 2), (1, 3)],               // 2, 13
    &[(1, 2), (1, 3), (0, 3), (0, 2)],       // 3, 12
    &[(0, 2), (2, 3), (1, 2)],               // 4, 11
    &[(0, 1), (1, 2), (0, 3), (2, 3)],       // 5, 10
    &[(0, 1), (2, 3), (1, 3), (0, 2)],       // 6, 9
    &[(0, 3), (1, 3), (2, 3)],               // 7, 8
];

/// Triangle indices per configuration, as backward offsets.
///
/// Indexed by the full 4-bit code. Each offset `n` resolves to index
/// `vertex_count - n` after the configuration's vertices have been
/// appended; three consecutive offsets form one triangle. Complementary
/// rows wind in opposite order so both sides of the surface face outward.
pub const CONFIG_TO_TRIANGLES: [&[usize]; 16] = [
    &[],                   // 0
    &[1, 2, 3],            // 1
    &[3, 2, 1],            // 2
    &[4, 3, 2, 1, 4, 2],   // 3
    &[3, 2, 1],            // 4
    &[2, 3, 4, 1, 3, 2],   // 5
    &[4, 3, 2, 3, 4, 1],   // 6
    &[1, 2, 3],            // 7
    &[3, 2, 1],            // 8
    &[2, 3, 4, 1, 4, 3],   // 9
    &[4, 3, 2, 2, 3, 1],   // 10
    &[1, 2, 3],            // 11
    &[2, 3, 4, 2, 4, 1],   // 12
    &[1, 2, 3],            // 13
    &[3, 2, 1],            // 14
    &[],                   // 15
];

/// Folds a configuration code onto its canonical mirror, `min(c, 15 - c)`.
#[inline]
pub fn canonical_code(code: u8) -> u8 {
    code.min(15 - code)
}

/// Edge-pair row for a configuration code.
///
/// Panics on codes outside `[0, 15]`: a code can only leave that range
/// through corrupted packing logic, which is unrecoverable.
#[inline]
pub fn edges_for(code: u8) -> &'static [(usize, usize)] {
    assert!(code <= 15, "configuration code {code} out of range, table corrupt");
    CONFIG_TO_EDGES[canonical_code(code) as usize]
}

/// Triangle-offset row for a configuration code.
///
/// Panics on codes outside `[0, 15]`, same contract as [`edges_for`].
#[inline]
pub fn triangles_for(code: u8) -> &'static [usize] {
    assert!(code <= 15, "configuration code {code} out of range, table corrupt");
    CONFIG_TO_TRIANGLES[code as usize]
}
