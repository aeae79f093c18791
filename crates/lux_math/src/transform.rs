// Transform utilities for Mat4
//
// Extends glam::Mat4 with the helpers primitives and bounding boxes need.
// Note: glam::Mat4 already provides transform_point3(), transform_vector3() and inverse()

use crate::{Aabb, EulerAngle};
use glam::{Mat3, Mat4, Vec3};

/// Build `translate(pivot + translate) * rotate * scale * translate(-pivot)`.
///
/// Scales and rotates about `pivot`, then moves by `translate`.
pub fn scale_rotate_translate(pivot: Vec3, scale: Vec3, rotate: EulerAngle, translate: Vec3) -> Mat4 {
    Mat4::from_translation(pivot + translate)
        * rotate.rotation_matrix()
        * Mat4::from_scale(scale)
        * Mat4::from_translation(-pivot)
}

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal (inverse-transpose of the upper 3x3).
    fn transform_normal(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return *aabb;
        }

        let (min, max) = (aabb.min, aabb.max);
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ];

        corners.iter().fold(Aabb::EMPTY, |mut result, &corner| {
            result.expand_point(self.transform_point3(corner));
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_vector3_no_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let vector = Vec3::new(1.0, 0.0, 0.0);

        // Translation should NOT affect vectors (w=0)
        assert_eq!(mat.transform_vector3(vector), vector);
    }

    #[test]
    fn test_scale_rotate_translate_keeps_pivot() {
        let pivot = Vec3::new(1.0, 2.0, 3.0);
        let mat = scale_rotate_translate(
            pivot,
            Vec3::splat(3.0),
            EulerAngle::new(10.0, 20.0, 30.0),
            Vec3::ZERO,
        );
        assert!((mat.transform_point3(pivot) - pivot).length() < 1e-5);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // A 45 degree plane squashed along Y: the normal must stay perpendicular
        let mat = Mat4::from_scale(Vec3::new(1.0, 0.5, 1.0));
        let tangent = Vec3::new(1.0, -1.0, 0.0);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();

        let new_tangent = mat.transform_vector3(tangent);
        let new_normal = mat.transform_normal(normal);
        assert!(new_tangent.dot(new_normal).abs() < 1e-5);
        assert!((new_normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min - Vec3::new(5.0, 5.0, 5.0)).length() < 0.001);
        assert!((transformed.max - Vec3::new(6.0, 6.0, 6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_empty_aabb_stays_empty() {
        let mat = Mat4::from_scale(Vec3::splat(2.0));
        assert!(mat.transform_aabb(&Aabb::EMPTY).is_empty());
    }
}
