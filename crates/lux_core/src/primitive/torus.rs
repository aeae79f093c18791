//! Torus primitive, intersected with the quartic solver.

use std::f64::consts::PI;

use lux_math::{polynomial, Aabb, Mat3, Mat4, Mat4Ext, Ray, Vec2, Vec3};

use super::Transform;
use crate::intersection::Intersection;

/// A torus centered at `position`. Locally the ring lies in the XZ plane
/// with the tube swept around +Y.
#[derive(Debug, Clone, PartialEq)]
pub struct Torus {
    pub position: Vec3,
    /// Distance from the center to the middle of the tube.
    pub outer_radius: f32,
    /// Radius of the tube.
    pub inner_radius: f32,
    pub rotation: Mat3,
}

impl Torus {
    pub fn new(position: Vec3, outer_radius: f32, inner_radius: f32) -> Self {
        Self {
            position,
            outer_radius: outer_radius.abs(),
            inner_radius: inner_radius.abs(),
            rotation: Mat3::IDENTITY,
        }
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let inverse = self.rotation.transpose();
        let local_origin = inverse * (ray.origin - self.position);
        let direction = (inverse * ray.direction).as_dvec3();

        // Start close to the torus; the quartic loses precision far away
        let bound = (self.outer_radius + self.inner_radius) as f64;
        let skip = (local_origin.length() as f64 - bound - 1.0).max(0.0);
        let origin = local_origin.as_dvec3() + direction * skip;

        let big_r2 = (self.outer_radius as f64).powi(2);
        let small_r2 = (self.inner_radius as f64).powi(2);
        let four_r2 = 4.0 * big_r2;

        let e = origin.length_squared() - big_r2 - small_r2;
        let f = origin.dot(direction);
        let dd = direction.length_squared();

        let roots = polynomial::solve_quartic(
            dd * dd,
            4.0 * dd * f,
            2.0 * dd * e + 4.0 * f * f + four_r2 * direction.y * direction.y,
            4.0 * f * e + 2.0 * four_r2 * origin.y * direction.y,
            e * e - four_r2 * (small_r2 - origin.y * origin.y),
        );

        let Some(t) = roots
            .iter()
            .map(|&root| (root + skip) as f32)
            .find(|&t| t >= ray.min_distance)
        else {
            return false;
        };
        if !isect.accepts(ray, t) {
            return false;
        }

        let p = local_origin + (inverse * ray.direction) * t;
        let param = p.length_squared() - self.outer_radius * self.outer_radius
            - self.inner_radius * self.inner_radius;
        let local_normal = Vec3::new(
            p.x * param,
            p.y * (param + 2.0 * self.outer_radius * self.outer_radius),
            p.z * param,
        )
        .normalize_or_zero();

        isect.set_hit(ray, t, self.rotation * local_normal);

        let ring = (p.x * p.x + p.z * p.z).sqrt();
        isect.texcoord = Vec2::new(
            (0.5 + (p.z as f64).atan2(p.x as f64) / (2.0 * PI)) as f32,
            (0.5 + (p.y as f64).atan2((ring - self.outer_radius) as f64) / (2.0 * PI)) as f32,
        );
        isect.set_tangent(self.rotation * Vec3::new(-p.z, 0.0, p.x));
        true
    }

    pub fn aabb(&self) -> Aabb {
        let reach = self.outer_radius + self.inner_radius;
        let local = Aabb::from_min_max(
            Vec3::new(-reach, -self.inner_radius, -reach),
            Vec3::new(reach, self.inner_radius, reach),
        );
        let matrix = Mat4::from_translation(self.position) * Mat4::from_mat3(self.rotation);
        matrix.transform_aabb(&local)
    }

    /// Both radii follow the X scale.
    pub fn transform(&mut self, transform: &Transform) {
        let scale = transform.scale.x.abs();
        self.position = transform.matrix().transform_point3(self.position);
        self.outer_radius *= scale;
        self.inner_radius *= scale;
        self.rotation = transform.rotation() * self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::CrossingDirection;
    use approx::assert_abs_diff_eq;
    use lux_math::EulerAngle;

    #[test]
    fn test_hit_outer_edge() {
        let torus = Torus::new(Vec3::ZERO, 2.0, 0.5);
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::NEG_X);
        let mut isect = Intersection::default();

        assert!(torus.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 7.5, epsilon = 1e-3);
        assert!((isect.normal - Vec3::X).length() < 1e-3);
        assert_eq!(isect.direction, CrossingDirection::In);
    }

    #[test]
    fn test_ray_through_hole_misses() {
        let torus = Torus::new(Vec3::ZERO, 2.0, 0.5);
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        let mut isect = Intersection::default();
        assert!(!torus.intersect(&ray, &mut isect));
    }

    #[test]
    fn test_hit_tube_from_above() {
        let torus = Torus::new(Vec3::ZERO, 2.0, 0.5);
        let ray = Ray::new(Vec3::new(2.0, 10.0, 0.0), Vec3::NEG_Y);
        let mut isect = Intersection::default();

        assert!(torus.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 9.5, epsilon = 1e-3);
        assert!((isect.normal - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_rotated_torus_stands_up() {
        let mut torus = Torus::new(Vec3::ZERO, 2.0, 0.5);
        torus.transform(&Transform::new(Vec3::ONE, EulerAngle::new(90.0, 0.0, 0.0), Vec3::ZERO));

        // Pitched upright, the ring reaches y = 2.5
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        let mut isect = Intersection::default();
        assert!(torus.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 7.5, epsilon = 1e-3);
    }
}
