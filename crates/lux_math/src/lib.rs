//! Lux math - vectors, colors, rays and bounding volumes.
//!
//! `glam` provides the vector and matrix types; this crate adds the
//! ray tracing specific pieces on top of it.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod color;
mod euler;
mod interval;
mod onb;
pub mod polynomial;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use color::Color;
pub use euler::EulerAngle;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::{scale_rotate_translate, Mat4Ext};

/// Generic tolerance for geometric comparisons.
pub const EPSILON: f32 = 1.0e-6;

/// Component of `v` along `axis` (0=X, 1=Y, 2=Z).
#[inline]
pub fn axis_component(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

/// Reflect `d` about the normal `n`.
#[inline]
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}
