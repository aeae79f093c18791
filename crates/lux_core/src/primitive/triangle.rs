//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use lux_math::{Aabb, Mat4Ext, Ray, Vec2, Vec3};

use super::Transform;
use crate::intersection::Intersection;

/// Determinant threshold below which the ray is treated as parallel.
const DETERMINANT_EPSILON: f32 = 1e-8;

/// A triangle with per-vertex normals and texture coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub texcoords: [Vec2; 3],
    /// Shade with the interpolated vertex normals instead of the face normal.
    pub normal_interpolation: bool,
    /// Reject hits on the back side (clockwise as seen from the ray).
    pub backface_culling: bool,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    /// Texture space U direction
    tangent: Vec3,
}

impl Triangle {
    /// Flat shaded triangle; counter-clockwise vertices face the viewer.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let mut triangle = Self {
            vertices: [v0, v1, v2],
            normals: [Vec3::ZERO; 3],
            texcoords: [Vec2::ZERO, Vec2::X, Vec2::Y],
            normal_interpolation: false,
            backface_culling: false,
            normal: Vec3::ZERO,
            tangent: Vec3::X,
        };
        triangle.initialize();
        triangle.normals = [triangle.normal; 3];
        triangle
    }

    /// Smooth shaded triangle with explicit vertex attributes.
    pub fn with_attributes(vertices: [Vec3; 3], normals: [Vec3; 3], texcoords: [Vec2; 3]) -> Self {
        let mut triangle = Self {
            vertices,
            normals: normals.map(|n| n.normalize_or_zero()),
            texcoords,
            normal_interpolation: true,
            backface_culling: false,
            normal: Vec3::ZERO,
            tangent: Vec3::X,
        };
        triangle.initialize();
        triangle
    }

    /// Recompute the face normal and tangent after the vertices change.
    pub fn initialize(&mut self) {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        self.normal = edge1.cross(edge2).normalize_or_zero();

        let duv1 = self.texcoords[1] - self.texcoords[0];
        let duv2 = self.texcoords[2] - self.texcoords[0];
        let r = duv1.x * duv2.y - duv2.x * duv1.y;

        self.tangent = if r.abs() > DETERMINANT_EPSILON {
            ((edge1 * duv2.y - edge2 * duv1.y) / r).normalize_or_zero()
        } else {
            edge1.normalize_or_zero()
        };
    }

    pub fn face_normal(&self) -> Vec3 {
        self.normal
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Parallel (or back facing when culling)
        if self.backface_culling {
            if a < DETERMINANT_EPSILON {
                return false;
            }
        } else if a.abs() < DETERMINANT_EPSILON {
            return false;
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = f * edge2.dot(q);
        if !isect.accepts(ray, t) {
            return false;
        }

        let w = 1.0 - u - v;
        let normal = if self.normal_interpolation {
            let interpolated = self.normals[0] * w + self.normals[1] * u + self.normals[2] * v;
            let interpolated = interpolated.normalize_or_zero();
            if interpolated == Vec3::ZERO {
                self.normal
            } else {
                interpolated
            }
        } else {
            self.normal
        };

        isect.set_hit(ray, t, normal);
        isect.texcoord = self.texcoords[0] * w + self.texcoords[1] * u + self.texcoords[2] * v;
        isect.set_tangent(self.tangent);
        true
    }

    pub fn aabb(&self) -> Aabb {
        // Pad thin dimensions to avoid degenerate AABBs
        let delta = Vec3::splat(0.0001);
        let aabb = Aabb::from_points(&self.vertices);
        Aabb::from_min_max(aabb.min - delta, aabb.max + delta)
    }

    pub fn transform(&mut self, transform: &Transform) {
        let matrix = transform.matrix();
        self.vertices = self.vertices.map(|v| matrix.transform_point3(v));
        self.normals = self.normals.map(|n| matrix.transform_normal(n));
        self.initialize();
    }
}
