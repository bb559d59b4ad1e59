//! # tetramarch
//!
//! Marching-tetrahedra isosurface extraction from boolean implicit
//! fields.
//!
//! A caller supplies a [`SignField`](field::SignField) — a pure
//! inside/outside predicate over world positions — and a
//! [`GridConfig`](grid::GridConfig) describing a cubic lattice. The
//! extractor splits every cell into six tetrahedra sharing a body
//! diagonal, samples the predicate at each tetrahedron corner, and
//! triangulates the sign crossings through lookup tables into a flat,
//! unwelded triangle mesh.
//!
//! ## Features
//!
//! - **CPU pipeline**: sequential reference evaluator, pure batch
//!   function of config and field
//! - **GPU pipeline** (feature `gpu`): the same evaluation as a wgpu
//!   compute kernel, one invocation per tetrahedron corner, with a
//!   single dispatch-then-readback round trip
//! - **Shared assembler**: both pipelines feed one mesh assembler
//!   through the same flat stream layout, so they produce equivalent
//!   meshes modulo floating-point rounding
//!
//! ## Example
//!
//! ```rust
//! use tetramarch::prelude::*;
//!
//! let config = GridConfig {
//!     grid_size: 5,
//!     cell_size: 1.0,
//!     ..Default::default()
//! };
//! let mesh = extract_mesh(&config, &SphereField { radius: 1.5 }).unwrap();
//! assert!(mesh.triangle_count() > 0);
//! ```

#![warn(missing_docs)]

pub mod assemble;
pub mod eval;
pub mod field;
pub mod grid;
pub mod stream;
pub mod tables;

#[cfg(feature = "gpu")]
pub mod gpu;

use thiserror::Error;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for a grid build.
///
/// Every category is fatal to the build it occurs in: a
/// partially-evaluated grid has no well-defined meaning, so nothing is
/// retried or degraded and no partial mesh is ever published.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Grid size must be at least 1 cell
    #[error("invalid grid size {0}, must be at least 1")]
    InvalidGridSize(usize),

    /// Cell size must be positive and finite
    #[error("invalid cell size {0}, must be positive and finite")]
    InvalidCellSize(f32),

    /// An evaluated stream does not have exactly `grid_size³ * 24` samples
    #[error(
        "stream size mismatch: expected {expected} samples, got {signs} signs / {positions} positions"
    )]
    StreamSizeMismatch {
        /// Expected sample count for the stream's grid size
        expected: usize,
        /// Actual sign count
        signs: usize,
        /// Actual position count
        positions: usize,
    },

    /// The GPU pipeline failed; the build is aborted, not retried on CPU
    #[cfg(feature = "gpu")]
    #[error("gpu evaluation failed: {0}")]
    Gpu(#[from] gpu::GpuError),
}

/// Extract a mesh on the CPU.
///
/// Validates the configuration, evaluates the field sequentially over
/// every cell and tetrahedron, and assembles the triangle mesh. Returns
/// a fresh [`Mesh`](assemble::Mesh) value on every call.
pub fn extract_mesh<F: field::SignField>(
    config: &grid::GridConfig,
    field: &F,
) -> Result<assemble::Mesh, ExtractError> {
    let stream = eval::evaluate(config, field)?;
    assemble::assemble(&stream)
}

/// Extract a mesh on the GPU.
///
/// One-shot convenience over [`gpu::GpuExtractor`]: builds the kernel
/// and buffers for this config, runs a single dispatch-then-readback
/// round trip, and assembles the result on the host. For repeated
/// builds over the same grid size, hold a `GpuExtractor` instead and
/// call [`evaluate`](gpu::GpuExtractor::evaluate) per build.
///
/// Produces a mesh equivalent to [`extract_mesh`] for the same field
/// and config, modulo floating-point rounding. A GPU failure aborts the
/// build; retrying on the CPU path is the caller's decision.
#[cfg(feature = "gpu")]
pub fn extract_mesh_gpu<F: field::WgslField>(
    config: &grid::GridConfig,
    field: &F,
) -> Result<assemble::Mesh, ExtractError> {
    config.validate()?;
    let extractor = gpu::GpuExtractor::new(config, field)?;
    let stream = extractor.evaluate(config)?;
    assemble::assemble(&stream)
}

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::assemble::{assemble, Mesh};
    pub use crate::eval::evaluate;
    pub use crate::field::{HalfSpaceField, SignField, SphereField, WgslField};
    pub use crate::grid::{midpoint, GridConfig};
    pub use crate::stream::TetraStream;
    pub use crate::extract_mesh;
    pub use crate::ExtractError;
    #[cfg(feature = "gpu")]
    pub use crate::gpu::{GpuError, GpuExtractor};
    #[cfg(feature = "gpu")]
    pub use crate::extract_mesh_gpu;
    pub use glam::{Quat, Vec3};
}

// Re-exports for convenience
pub use assemble::Mesh;
pub use field::SignField;
pub use grid::GridConfig;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn basic_workflow() {
        let config = GridConfig::default();
        let mesh = extract_mesh(&config, &SphereField { radius: 1.5 }).unwrap();
        assert!(mesh.vertex_count() > 0);
        assert!(mesh.triangle_count() > 0);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert_eq!(mesh.face_normals.len(), mesh.triangle_count());
    }

    #[test]
    fn empty_fields_make_empty_meshes() {
        let config = GridConfig::default();

        let outside = extract_mesh(&config, &(|_: Vec3| false)).unwrap();
        assert_eq!(outside.vertex_count(), 0);
        assert_eq!(outside.indices.len(), 0);

        let inside = extract_mesh(&config, &(|_: Vec3| true)).unwrap();
        assert_eq!(inside.vertex_count(), 0);
        assert_eq!(inside.indices.len(), 0);
    }

    #[test]
    fn config_errors_abort_the_build() {
        let config = GridConfig {
            cell_size: -1.0,
            ..Default::default()
        };
        let result = extract_mesh(&config, &SphereField { radius: 1.0 });
        assert!(matches!(result, Err(ExtractError::InvalidCellSize(_))));
    }
}
