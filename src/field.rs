//! Sign fields: the boolean boundary oracle that defines the surface
//!
//! The extractor is agnostic about what it is meshing; callers supply a
//! predicate deciding whether a world position lies inside the volume.
//! The predicate must be pure — both evaluators call it redundantly (up
//! to 8 times per cell, once per referenced corner per tetrahedron,
//! deliberately not deduplicated).

use glam::Vec3;

/// Boolean implicit field sampled by the evaluators.
pub trait SignField {
    /// True when `p` lies inside the volume bounded by the surface.
    fn contains(&self, p: Vec3) -> bool;
}

impl<F> SignField for F
where
    F: Fn(Vec3) -> bool,
{
    fn contains(&self, p: Vec3) -> bool {
        self(p)
    }
}

/// A sign field that can also run inside the GPU evaluation kernel.
///
/// Implementors emit a WGSL function with the fixed signature
/// `fn field_contains(p: vec3<f32>) -> bool` that makes the same sign
/// decision as [`SignField::contains`] at every corner position. The two
/// sides diverging is a correctness bug: the CPU and GPU pipelines are
/// specified to produce equivalent meshes.
pub trait WgslField: SignField {
    /// WGSL source of the `field_contains` function.
    fn wgsl_contains(&self) -> String;
}

/// Solid sphere of the given radius, centered on the world origin.
#[derive(Debug, Clone, Copy)]
pub struct SphereField {
    /// Sphere radius.
    pub radius: f32,
}

impl SignField for SphereField {
    fn contains(&self, p: Vec3) -> bool {
        p.length() <= self.radius
    }
}

impl WgslField for SphereField {
    fn wgsl_contains(&self) -> String {
        format!(
            "fn field_contains(p: vec3<f32>) -> bool {{\n    \
             return length(p) <= {:?};\n}}",
            self.radius
        )
    }
}

/// Everything below a horizontal plane at the given height.
#[derive(Debug, Clone, Copy)]
pub struct HalfSpaceField {
    /// World-space Y of the surface plane.
    pub height: f32,
}

impl SignField for HalfSpaceField {
    fn contains(&self, p: Vec3) -> bool {
        p.y < self.height
    }
}

impl WgslField for HalfSpaceField {
    fn wgsl_contains(&self) -> String {
        format!(
            "fn field_contains(p: vec3<f32>) -> bool {{\n    \
             return p.y < {:?};\n}}",
            self.height
        )
    }
}
