//! Blinn blob (metaball) implicit surface.
//!
//! The field is `Σ exp(b·(1 − d²/r²))` over all blob points, where `d` is
//! the distance to the point, `r` its radius and `b` its blobbiness. The
//! surface is where the field equals `threshold`. Rays are marched through
//! the bounding box at a fixed step and sign changes are bisected a fixed
//! number of times.

use lux_math::{Aabb, Ray, Vec3};

use super::box_shape::slab_crossing;
use super::sphere::sphere_texcoord;
use super::Transform;
use crate::intersection::Intersection;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlobPoint {
    pub position: Vec3,
    pub radius: f32,
    pub blobbiness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlinnBlob {
    pub points: Vec<BlobPoint>,
    pub threshold: f32,
    /// Number of field samples along the part of the ray inside the bounds.
    pub march_steps: u32,
    /// Bisection iterations once a sign change is bracketed.
    pub solver_iterations: u32,
}

impl BlinnBlob {
    pub fn new(points: Vec<BlobPoint>, threshold: f32) -> Self {
        Self {
            points,
            threshold,
            march_steps: 128,
            solver_iterations: 32,
        }
    }

    /// Field value minus the threshold; positive inside the surface.
    pub fn field(&self, p: Vec3) -> f32 {
        let sum: f32 = self
            .points
            .iter()
            .map(|point| {
                let d2 = (p - point.position).length_squared();
                let r2 = point.radius * point.radius;
                (point.blobbiness * (1.0 - d2 / r2)).exp()
            })
            .sum();
        sum - self.threshold
    }

    /// Outward surface normal (negated field gradient).
    fn normal(&self, p: Vec3) -> Vec3 {
        self.points
            .iter()
            .fold(Vec3::ZERO, |acc, point| {
                let offset = p - point.position;
                let r2 = point.radius * point.radius;
                let weight = (point.blobbiness * (1.0 - offset.length_squared() / r2)).exp();
                acc + offset * (2.0 * point.blobbiness * weight / r2)
            })
            .normalize_or_zero()
    }

    /// Radius beyond which a point cannot push the field over the threshold,
    /// even if every other point contributes the same amount.
    fn influence_radius(&self, point: &BlobPoint) -> f32 {
        let count = self.points.len().max(1) as f32;
        let share = (self.threshold / count).max(f32::MIN_POSITIVE);
        let scale = 1.0 - share.ln() / point.blobbiness.max(f32::MIN_POSITIVE);
        point.radius * scale.max(0.0).sqrt()
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        if self.points.is_empty() {
            return false;
        }

        let bounds = self.aabb();
        let Some(crossing) = slab_crossing(bounds.min, bounds.max, ray.origin, ray.direction) else {
            return false;
        };

        let start = crossing.near.max(ray.min_distance);
        let end = crossing.far.min(ray.max_distance).min(isect.distance);
        if end <= start {
            return false;
        }

        let steps = self.march_steps.max(1);
        let step = (end - start) / steps as f32;
        let mut t_prev = start;
        let mut f_prev = self.field(ray.at(t_prev));

        for i in 1..=steps {
            let t = start + step * i as f32;
            let f = self.field(ray.at(t));

            if (f_prev <= 0.0) != (f <= 0.0) {
                let t_hit = self.bisect(ray, t_prev, f_prev, t);
                if !isect.accepts(ray, t_hit) {
                    return false;
                }

                let position = ray.at(t_hit);
                let outward = self.normal(position);
                isect.set_hit(ray, t_hit, outward);
                isect.texcoord = sphere_texcoord(outward);
                isect.set_tangent(Vec3::new(-outward.z, 0.0, outward.x));
                return true;
            }

            t_prev = t;
            f_prev = f;
        }

        false
    }

    fn bisect(&self, ray: &Ray, mut low: f32, f_low: f32, mut high: f32) -> f32 {
        let low_inside = f_low > 0.0;
        for _ in 0..self.solver_iterations {
            let mid = 0.5 * (low + high);
            if (self.field(ray.at(mid)) > 0.0) == low_inside {
                low = mid;
            } else {
                high = mid;
            }
        }
        0.5 * (low + high)
    }

    pub fn aabb(&self) -> Aabb {
        self.points.iter().fold(Aabb::EMPTY, |mut aabb, point| {
            let reach = self.influence_radius(point);
            aabb.expand(&Aabb::from_center_extent(point.position, Vec3::splat(2.0 * reach)));
            aabb
        })
    }

    /// Point radii follow the X scale.
    pub fn transform(&mut self, transform: &Transform) {
        let matrix = transform.matrix();
        let scale = transform.scale.x.abs();
        for point in &mut self.points {
            point.position = matrix.transform_point3(point.position);
            point.radius *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn single(radius: f32, blobbiness: f32, threshold: f32) -> BlinnBlob {
        BlinnBlob::new(
            vec![BlobPoint {
                position: Vec3::ZERO,
                radius,
                blobbiness,
            }],
            threshold,
        )
    }

    #[test]
    fn test_single_point_is_a_sphere() {
        // exp(b(1 - d²/r²)) = 1 exactly at d = r
        let blob = single(1.0, 2.0, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();

        assert!(blob.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 4.0, epsilon = 1e-3);
        assert!((isect.normal - Vec3::Z).length() < 1e-3);
    }

    #[test]
    fn test_two_points_merge() {
        let blob = BlinnBlob::new(
            vec![
                BlobPoint {
                    position: Vec3::new(-0.9, 0.0, 0.0),
                    radius: 1.0,
                    blobbiness: 2.0,
                },
                BlobPoint {
                    position: Vec3::new(0.9, 0.0, 0.0),
                    radius: 1.0,
                    blobbiness: 2.0,
                },
            ],
            1.0,
        );

        // Midpoint field is 2·exp(2·(1 − 0.81)) > 1, so the blobs join
        assert!(blob.field(Vec3::ZERO) > 0.0);

        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let mut isect = Intersection::default();
        assert!(blob.intersect(&ray, &mut isect));
        assert!(isect.distance < 5.0);
    }

    #[test]
    fn test_miss() {
        let blob = single(1.0, 2.0, 1.0);
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        let mut isect = Intersection::default();
        assert!(!blob.intersect(&ray, &mut isect));
    }

    #[test]
    fn test_bounds_contain_surface() {
        let blob = single(1.0, 2.0, 1.0);
        let aabb = blob.aabb();
        assert!(aabb.max.x >= 1.0);
        assert!(aabb.min.x <= -1.0);
    }
}
