//! Infinite plane primitive.

use lux_math::{Aabb, Mat4Ext, Onb, Ray, Vec2, Vec3, EPSILON};

use super::Transform;
use crate::intersection::Intersection;

/// Half size of the finite box used to bound a plane in a BVH.
const PLANE_EXTENT: f32 = 1.0e6;

/// An infinite plane through `position` with unit `normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub position: Vec3,
    pub normal: Vec3,
    /// In-plane axes used for texture coordinates.
    onb: Onb,
}

impl Plane {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            position,
            normal,
            onb: Onb::from_normal(normal),
        }
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let denominator = ray.direction.dot(self.normal);
        if denominator.abs() < EPSILON {
            return false;
        }

        let t = (self.position - ray.origin).dot(self.normal) / denominator;
        if !isect.accepts(ray, t) {
            return false;
        }

        isect.set_hit(ray, t, self.normal);
        let local = isect.position - self.position;
        isect.texcoord = Vec2::new(local.dot(self.onb.u), local.dot(self.onb.v));
        isect.set_tangent(self.onb.u);
        true
    }

    /// Large finite bound, thin along the normal when it is axis aligned.
    pub fn aabb(&self) -> Aabb {
        let mut extent = Vec3::splat(2.0 * PLANE_EXTENT);
        for axis in 0..3 {
            if self.normal[axis].abs() > 1.0 - EPSILON {
                extent[axis] = 2.0 * EPSILON;
            }
        }
        Aabb::from_center_extent(self.position, extent)
    }

    pub fn transform(&mut self, transform: &Transform) {
        let matrix = transform.matrix();
        *self = Plane::new(
            matrix.transform_point3(self.position),
            matrix.transform_normal(self.normal),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::CrossingDirection;
    use approx::assert_abs_diff_eq;
    use lux_math::EulerAngle;

    #[test]
    fn test_hit_from_above() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y);
        let ray = Ray::new(Vec3::new(1.0, 4.0, 2.0), Vec3::NEG_Y);
        let mut isect = Intersection::default();

        assert!(plane.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 4.0, epsilon = 1e-5);
        assert_eq!(isect.normal, Vec3::Y);
        assert_eq!(isect.direction, CrossingDirection::In);
    }

    #[test]
    fn test_normal_faces_ray_from_below() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y);
        let ray = Ray::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y);
        let mut isect = Intersection::default();

        assert!(plane.intersect(&ray, &mut isect));
        assert_eq!(isect.normal, Vec3::NEG_Y);
    }

    #[test]
    fn test_parallel_ray_misses() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let mut isect = Intersection::default();
        assert!(!plane.intersect(&ray, &mut isect));
    }

    #[test]
    fn test_aabb_is_thin_for_axis_aligned_normal() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        let aabb = plane.aabb();
        assert!(aabb.extent().y < 1e-3);
        assert!(aabb.extent().x > 1e5);
        assert_abs_diff_eq!(aabb.center().y, 2.0);
    }

    #[test]
    fn test_transform_rotates_normal() {
        let mut plane = Plane::new(Vec3::ZERO, Vec3::Y);
        plane.transform(&Transform::new(
            Vec3::ONE,
            EulerAngle::new(0.0, 0.0, 90.0),
            Vec3::new(0.0, 1.0, 0.0),
        ));
        assert!((plane.normal - Vec3::NEG_X).length() < 1e-5);
        assert!((plane.position - Vec3::Y).length() < 1e-5);
    }
}
