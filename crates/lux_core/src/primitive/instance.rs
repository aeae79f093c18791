//! Transformed reference to another primitive.

use lux_math::{Aabb, Mat4, Mat4Ext, Ray};

use super::Transform;
use crate::intersection::Intersection;
use crate::scene::Scene;

/// Renders the referenced primitive under an affine transformation.
#[derive(Debug, Clone)]
pub struct Instance {
    pub primitive_id: u32,
    transformation: Mat4,
    inverse: Mat4,
    pub(crate) target: usize,
    pub(crate) bounds: Aabb,
}

impl Instance {
    pub fn new(primitive_id: u32, transform: &Transform) -> Self {
        Self::from_matrix(primitive_id, transform.matrix())
    }

    pub fn from_matrix(primitive_id: u32, transformation: Mat4) -> Self {
        Self {
            primitive_id,
            transformation,
            inverse: transformation.inverse(),
            target: 0,
            bounds: Aabb::EMPTY,
        }
    }

    pub fn transformation(&self) -> Mat4 {
        self.transformation
    }

    /// Cache world bounds from the target's local bounds.
    pub(crate) fn update_bounds(&mut self, target: &Aabb) {
        self.bounds = self.transformation.transform_aabb(target);
    }

    pub fn aabb(&self) -> Aabb {
        self.bounds
    }

    /// Compose an additional transform on the world side.
    pub fn transform(&mut self, transform: &Transform) {
        self.transformation = transform.matrix() * self.transformation;
        self.inverse = self.transformation.inverse();
        self.bounds = transform.matrix().transform_aabb(&self.bounds);
    }

    pub fn intersect(&self, scene: &Scene, ray: &Ray, isect: &mut Intersection) -> bool {
        let local_direction = self.inverse.transform_vector3(ray.direction);
        let scale = local_direction.length();
        if scale <= 0.0 || !scale.is_finite() {
            return false;
        }

        // Local distances are world distances stretched by `scale`
        let mut local_ray = *ray;
        local_ray.origin = self.inverse.transform_point3(ray.origin);
        local_ray.direction = local_direction;
        local_ray.precalculate();
        local_ray.min_distance = ray.min_distance * scale;
        local_ray.max_distance = ray.max_distance * scale;

        let mut local = *isect;
        local.distance = isect.distance * scale;

        if !scene.primitives[self.target].intersect(scene, &local_ray, &mut local) {
            return false;
        }

        let distance = local.distance / scale;
        let tangent = self.transformation.transform_vector3(local.onb.u);
        local.distance = distance;
        local.position = ray.at(distance);
        local.normal = self.transformation.transform_normal(local.normal);
        local.set_tangent(tangent);
        *isect = local;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::primitive::{Primitive, PrimitiveKind, Sphere};
    use approx::assert_abs_diff_eq;
    use lux_math::{EulerAngle, Vec3};

    fn scene_with(transform: Transform) -> Scene {
        let mut scene = Scene::default();
        scene.materials.push(Material::new(0));
        scene.add_primitive(Primitive::new(1, 0, PrimitiveKind::Sphere(Sphere::new(Vec3::ZERO, 1.0))).invisible());
        scene.add_primitive(Primitive::new(2, 0, PrimitiveKind::Instance(Instance::new(1, &transform))));
        scene.initialize().expect("scene");
        scene
    }

    #[test]
    fn test_translated_instance() {
        let scene = scene_with(Transform::new(Vec3::ONE, EulerAngle::ZERO, Vec3::new(5.0, 0.0, 0.0)));
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();

        assert!(scene.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 9.0, epsilon = 1e-4);
        assert!((isect.position - Vec3::new(5.0, 0.0, 1.0)).length() < 1e-4);
        assert_eq!(isect.primitive_id, Some(2));
    }

    #[test]
    fn test_scaled_instance_reports_world_distance() {
        let scene = scene_with(Transform::new(Vec3::splat(2.0), EulerAngle::ZERO, Vec3::ZERO));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();

        assert!(scene.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 8.0, epsilon = 1e-4);
        assert!((isect.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_instance_bounds() {
        let scene = scene_with(Transform::new(Vec3::ONE, EulerAngle::ZERO, Vec3::new(0.0, 3.0, 0.0)));
        let aabb = scene.primitives[1].aabb();
        assert_abs_diff_eq!(aabb.min.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(aabb.max.y, 4.0, epsilon = 1e-5);
    }
}
