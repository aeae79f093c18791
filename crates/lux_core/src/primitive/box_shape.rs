//! Oriented box primitive.

use lux_math::{Aabb, Mat3, Mat4, Mat4Ext, Ray, Vec2, Vec3};

use super::Transform;
use crate::intersection::{CrossingDirection, Intersection};

/// Entry and exit of a ray through an axis-aligned slab set, with the
/// outward normals of the faces crossed.
#[derive(Debug, Copy, Clone)]
pub(crate) struct SlabCrossing {
    pub near: f32,
    pub near_normal: Vec3,
    pub far: f32,
    pub far_normal: Vec3,
}

/// Slab crossing of a ray against the box `[min, max]`.
///
/// Returns `None` when the ray misses or the box lies entirely behind the
/// origin. Axes the ray is parallel to only reject when the origin is
/// outside that slab.
pub(crate) fn slab_crossing(min: Vec3, max: Vec3, origin: Vec3, direction: Vec3) -> Option<SlabCrossing> {
    let mut crossing = SlabCrossing {
        near: f32::NEG_INFINITY,
        near_normal: Vec3::ZERO,
        far: f32::INFINITY,
        far_normal: Vec3::ZERO,
    };

    for axis in 0..3 {
        let mut face = Vec3::ZERO;
        face[axis] = 1.0;

        if direction[axis] == 0.0 {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / direction[axis];
        let t0 = (min[axis] - origin[axis]) * inv;
        let t1 = (max[axis] - origin[axis]) * inv;
        let (near, near_normal, far, far_normal) = if t0 < t1 {
            (t0, -face, t1, face)
        } else {
            (t1, face, t0, -face)
        };

        if near > crossing.near {
            crossing.near = near;
            crossing.near_normal = near_normal;
        }
        if far < crossing.far {
            crossing.far = far;
            crossing.far_normal = far_normal;
        }
    }

    if crossing.far < crossing.near || crossing.far < 0.0 {
        return None;
    }
    Some(crossing)
}

/// A box centered at `position` with full side lengths `extent`, rotated
/// by `rotation`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    pub position: Vec3,
    pub extent: Vec3,
    pub rotation: Mat3,
}

impl BoxShape {
    pub fn new(position: Vec3, extent: Vec3) -> Self {
        Self {
            position,
            extent: extent.abs(),
            rotation: Mat3::IDENTITY,
        }
    }

    fn to_local(&self, ray: &Ray) -> (Vec3, Vec3) {
        let inverse = self.rotation.transpose();
        (inverse * (ray.origin - self.position), inverse * ray.direction)
    }

    fn crossing(&self, ray: &Ray) -> Option<(SlabCrossing, Vec3, Vec3)> {
        let (origin, direction) = self.to_local(ray);
        let half = self.extent * 0.5;
        slab_crossing(-half, half, origin, direction).map(|c| (c, origin, direction))
    }

    fn fill(&self, ray: &Ray, t: f32, local_normal: Vec3, local_point: Vec3, isect: &mut Intersection) {
        isect.set_hit(ray, t, self.rotation * local_normal);

        // Face axis from the normal, texture axes from the other two
        let axis = if local_normal.x != 0.0 {
            0
        } else if local_normal.y != 0.0 {
            1
        } else {
            2
        };
        let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
        let size = self.extent.max(Vec3::splat(f32::MIN_POSITIVE));
        isect.texcoord = Vec2::new(
            local_point[a] / size[a] + 0.5,
            local_point[b] / size[b] + 0.5,
        );

        let mut tangent = Vec3::ZERO;
        tangent[a] = 1.0;
        isect.set_tangent(self.rotation * tangent);
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let Some((crossing, origin, direction)) = self.crossing(ray) else {
            return false;
        };

        let (t, normal) = if crossing.near >= ray.min_distance {
            (crossing.near, crossing.near_normal)
        } else {
            (crossing.far, crossing.far_normal)
        };
        if !isect.accepts(ray, t) {
            return false;
        }

        self.fill(ray, t, normal, origin + direction * t, isect);
        true
    }

    /// Entry and exit crossings regardless of the ray clipping interval.
    pub fn intersect_span(&self, ray: &Ray) -> Option<[Intersection; 2]> {
        let (crossing, origin, direction) = self.crossing(ray)?;

        let mut entry = Intersection::default();
        self.fill(ray, crossing.near, crossing.near_normal, origin + direction * crossing.near, &mut entry);
        entry.direction = CrossingDirection::In;

        let mut exit = Intersection::default();
        self.fill(ray, crossing.far, crossing.far_normal, origin + direction * crossing.far, &mut exit);
        exit.direction = CrossingDirection::Out;

        Some([entry, exit])
    }

    pub fn aabb(&self) -> Aabb {
        let matrix = Mat4::from_translation(self.position) * Mat4::from_mat3(self.rotation);
        matrix.transform_aabb(&Aabb::from_center_extent(Vec3::ZERO, self.extent))
    }

    pub fn transform(&mut self, transform: &Transform) {
        self.position = transform.matrix().transform_point3(self.position);
        self.extent *= transform.scale.abs();
        self.rotation = transform.rotation() * self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lux_math::EulerAngle;

    #[test]
    fn test_hit_front_face() {
        let shape = BoxShape::new(Vec3::ZERO, Vec3::splat(2.0));
        let ray = Ray::new(Vec3::new(0.2, 0.3, 5.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();

        assert!(shape.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 4.0, epsilon = 1e-5);
        assert_eq!(isect.normal, Vec3::Z);
        assert_eq!(isect.direction, CrossingDirection::In);
        assert_abs_diff_eq!(isect.texcoord.x, 0.6, epsilon = 1e-5);
        assert_abs_diff_eq!(isect.texcoord.y, 0.65, epsilon = 1e-5);
    }

    #[test]
    fn test_axis_parallel_miss() {
        let shape = BoxShape::new(Vec3::ZERO, Vec3::splat(2.0));
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();
        assert!(!shape.intersect(&ray, &mut isect));
        assert!(shape.intersect_span(&ray).is_none());
    }

    #[test]
    fn test_inside_hits_exit_face() {
        let shape = BoxShape::new(Vec3::ZERO, Vec3::splat(4.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let mut isect = Intersection::default();

        assert!(shape.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 2.0, epsilon = 1e-5);
        assert_eq!(isect.direction, CrossingDirection::Out);
        assert_eq!(isect.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_span() {
        let shape = BoxShape::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let [entry, exit] = shape.intersect_span(&ray).expect("span");
        assert_abs_diff_eq!(entry.distance, 4.5, epsilon = 1e-5);
        assert_abs_diff_eq!(exit.distance, 5.5, epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_box() {
        let mut shape = BoxShape::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        shape.transform(&Transform::new(Vec3::ONE, EulerAngle::new(0.0, 45.0, 0.0), Vec3::ZERO));

        // A corner now points along +X; the face next to it is x + z = sqrt(2)
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.1), Vec3::NEG_X);
        let mut isect = Intersection::default();
        assert!(shape.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 5.1 - 2.0_f32.sqrt(), epsilon = 1e-4);

        let aabb = shape.aabb();
        assert_abs_diff_eq!(aabb.max.x, 2.0_f32.sqrt(), epsilon = 1e-4);
    }
}
