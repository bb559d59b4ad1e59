//! Mesh assembly from an evaluated tetra stream
//!
//! Walks the flat stream in groups of 4 slots, packs each group into a
//! configuration code and expands it through the lookup tables into
//! midpoint vertices and backward-offset triangle indices. Vertices are
//! never welded: every tetrahedron independently owns the vertices it
//! emits, so normals are flat per-face by construction.
//!
//! Given identical streams the output is byte-identical — assembly is
//! deterministic and runs sequentially on the host in both pipelines.

use glam::Vec3;

use crate::grid::midpoint;
use crate::stream::TetraStream;
use crate::tables::{edges_for, triangles_for};
use crate::ExtractError;

/// Extracted triangle mesh.
///
/// A fresh value is produced on every build; the extractor never mutates
/// a mesh it has already returned. Consumers bind it read-only.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Interpolated vertex positions, in emission order.
    pub vertices: Vec<Vec3>,
    /// Triangle indices into `vertices`, stride 3.
    pub indices: Vec<u32>,
    /// One flat normal per triangle, recomputed from winding.
    pub face_normals: Vec<Vec3>,
}

impl Mesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Assemble a mesh from an evaluated stream.
///
/// Accepts the output of either evaluator — the input contract is the
/// flat stream layout, nothing backend-specific. Trivial codes (0, 15)
/// contribute nothing; a fully-inside or fully-outside grid therefore
/// yields an empty mesh.
pub fn assemble(stream: &TetraStream) -> Result<Mesh, ExtractError> {
    stream.check()?;

    let mut vertices: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for base in (0..stream.len()).step_by(4) {
        let code = stream.code_at(base);
        if code == 0 || code == 15 {
            continue;
        }

        for &(a, b) in edges_for(code) {
            vertices.push(midpoint(
                stream.positions[base + a],
                stream.positions[base + b],
            ));
        }
        for &offset in triangles_for(code) {
            indices.push((vertices.len() - offset) as u32);
        }
    }

    let face_normals = face_normals(&vertices, &indices);
    Ok(Mesh {
        vertices,
        indices,
        face_normals,
    })
}

/// Flat per-triangle normals from winding order.
///
/// No vertex-normal averaging: vertices are not shared, so a per-face
/// normal is the whole story. Degenerate triangles get a zero normal.
fn face_normals(vertices: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    indices
        .chunks_exact(3)
        .map(|tri| {
            let a = vertices[tri[0] as usize];
            let b = vertices[tri[1] as usize];
            let c = vertices[tri[2] as usize];
            let n = (b - a).cross(c - a);
            if n.length_squared() > 0.0 {
                n.normalize()
            } else {
                Vec3::ZERO
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridConfig, SLOTS_PER_CELL};
    use crate::tables::TETRA_TO_CORNER;

    /// Single-cell stream with one tetrahedron forced to `code`, the
    /// other five left trivial.
    fn single_tetra_stream(code: u8) -> TetraStream {
        let config = GridConfig {
            grid_size: 1,
            ..Default::default()
        };
        let corners = config.cell_corners(0, 0, 0);

        let mut stream = TetraStream::with_capacity(1);
        for tetra in 0..6 {
            for slot in 0..4 {
                stream.positions.push(corners[TETRA_TO_CORNER[tetra][slot]]);
                stream.signs.push(tetra == 0 && code & (1 << slot) != 0);
            }
        }
        assert_eq!(stream.len(), SLOTS_PER_CELL);
        stream
    }

    #[test]
    fn trivial_codes_emit_nothing() {
        for code in [0u8, 15] {
            let mesh = assemble(&single_tetra_stream(code)).unwrap();
            assert_eq!(mesh.vertex_count(), 0, "code {code}");
            assert_eq!(mesh.triangle_count(), 0, "code {code}");
        }
    }

    #[test]
    fn three_vertex_codes_emit_one_triangle() {
        for code in [1u8, 2, 4, 7, 8, 11, 13, 14] {
            let mesh = assemble(&single_tetra_stream(code)).unwrap();
            assert_eq!(mesh.vertex_count(), 3, "code {code}");
            assert_eq!(mesh.triangle_count(), 1, "code {code}");
            assert_eq!(mesh.face_normals.len(), 1, "code {code}");
        }
    }

    #[test]
    fn four_vertex_codes_emit_two_triangles() {
        for code in [3u8, 5, 6, 9, 10, 12] {
            let mesh = assemble(&single_tetra_stream(code)).unwrap();
            assert_eq!(mesh.vertex_count(), 4, "code {code}");
            assert_eq!(mesh.triangle_count(), 2, "code {code}");
        }
    }

    #[test]
    fn complementary_codes_wind_in_opposite_directions() {
        for code in 1u8..8 {
            let mesh_a = assemble(&single_tetra_stream(code)).unwrap();
            let mesh_b = assemble(&single_tetra_stream(15 - code)).unwrap();
            assert_eq!(mesh_a.vertices, mesh_b.vertices, "code {code}");
            for (na, nb) in mesh_a.face_normals.iter().zip(&mesh_b.face_normals) {
                assert!(
                    na.dot(*nb) < -0.99,
                    "codes {code}/{} normals not opposed: {na:?} vs {nb:?}",
                    15 - code
                );
            }
        }
    }

    #[test]
    fn normals_point_away_from_the_inside_corner() {
        // code 1: slot 0 inside; the single triangle must face slot 0's corner
        let stream = single_tetra_stream(1);
        let mesh = assemble(&stream).unwrap();
        let inside = stream.positions[0];
        let centroid = (mesh.vertices[0] + mesh.vertices[1] + mesh.vertices[2]) / 3.0;
        let outward = centroid - inside;
        assert!(
            mesh.face_normals[0].dot(outward) > 0.0,
            "triangle faces the inside corner"
        );
    }

    #[test]
    fn quad_codes_split_along_a_shared_diagonal() {
        // both triangles of a 4-vertex code must agree on orientation
        for code in [3u8, 5, 6, 9, 10, 12] {
            let mesh = assemble(&single_tetra_stream(code)).unwrap();
            let n0 = mesh.face_normals[0];
            let n1 = mesh.face_normals[1];
            assert!(
                n0.dot(n1) > 0.0,
                "code {code} quad halves disagree: {n0:?} vs {n1:?}"
            );
        }
    }

    #[test]
    fn indices_reference_emitted_vertices() {
        let mesh = assemble(&single_tetra_stream(5)).unwrap();
        for &idx in &mesh.indices {
            assert!((idx as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn malformed_stream_is_fatal() {
        let mut stream = single_tetra_stream(1);
        stream.signs.pop();
        stream.positions.pop();
        assert!(matches!(
            assemble(&stream),
            Err(ExtractError::StreamSizeMismatch { .. })
        ));
    }
}
