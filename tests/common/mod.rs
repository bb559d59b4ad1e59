//! Common test helpers for tetramarch integration tests

#![allow(dead_code)]

use tetramarch::prelude::*;

/// The canonical extraction scenario: a radius-1.5 sphere on a 5-cell
/// unit grid centered at the origin. The surface sits fully inside the
/// grid and no lattice corner lands exactly on it, so sign decisions
/// are robust against rounding.
pub fn sphere_scenario() -> (GridConfig, SphereField) {
    let config = GridConfig {
        grid_size: 5,
        cell_size: 1.0,
        ..Default::default()
    };
    (config, SphereField { radius: 1.5 })
}

/// Bit-exact key for a vertex position.
pub fn position_key(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Bit-exact, order-independent key for a triangle edge.
pub fn edge_key(a: Vec3, b: Vec3) -> ([u32; 3], [u32; 3]) {
    let (ka, kb) = (position_key(a), position_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Small deterministic generator for randomized-config tests.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 32) as u32
    }

    /// Uniform-ish float in [lo, hi).
    pub fn next_f32(&mut self, lo: f32, hi: f32) -> f32 {
        let t = self.next_u32() as f32 / u32::MAX as f32;
        lo + t * (hi - lo)
    }

    /// Random normalized rotation.
    pub fn next_quat(&mut self) -> Quat {
        let axis = Vec3::new(
            self.next_f32(-1.0, 1.0),
            self.next_f32(-1.0, 1.0),
            self.next_f32(-1.0, 1.0),
        )
        .normalize();
        Quat::from_axis_angle(axis, self.next_f32(0.1, 6.0))
    }
}
