//! Sphere primitive.

use std::f32::consts::PI;

use lux_math::{Aabb, Ray, Vec2, Vec3};

use super::Transform;
use crate::intersection::{CrossingDirection, Intersection};

/// A sphere given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius: radius.max(0.0),
        }
    }

    /// Entry and exit distances, `None` on a miss or when the whole
    /// sphere lies behind the ray origin.
    fn roots(&self, ray: &Ray) -> Option<(f32, f32)> {
        let oc = ray.origin - self.position;
        let b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let t1 = -b + sqrtd;

        // Origin outside and sphere behind
        if c > 0.0 && t1 < 0.0 {
            return None;
        }

        Some((-b - sqrtd, t1))
    }

    fn fill(&self, ray: &Ray, t: f32, isect: &mut Intersection) {
        let outward = (ray.at(t) - self.position) / self.radius;
        isect.set_hit(ray, t, outward);
        isect.texcoord = sphere_texcoord(outward);
        isect.set_tangent(Vec3::new(-outward.z, 0.0, outward.x));
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let Some((t0, t1)) = self.roots(ray) else {
            return false;
        };

        // Near root unless it is clipped away (origin inside the sphere)
        let t = if t0 >= ray.min_distance { t0 } else { t1 };
        if !isect.accepts(ray, t) {
            return false;
        }

        self.fill(ray, t, isect);
        true
    }

    /// Entry and exit crossings regardless of the ray clipping interval.
    pub fn intersect_span(&self, ray: &Ray) -> Option<[Intersection; 2]> {
        let (t0, t1) = self.roots(ray)?;

        let mut entry = Intersection::default();
        self.fill(ray, t0, &mut entry);
        entry.direction = CrossingDirection::In;

        let mut exit = Intersection::default();
        self.fill(ray, t1, &mut exit);
        exit.direction = CrossingDirection::Out;

        Some([entry, exit])
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_extent(self.position, Vec3::splat(2.0 * self.radius))
    }

    /// Move the center; the radius follows the X scale.
    pub fn transform(&mut self, transform: &Transform) {
        self.position = transform.matrix().transform_point3(self.position);
        self.radius *= transform.scale.x.abs();
    }
}

/// Spherical mapping of a unit normal.
pub(crate) fn sphere_texcoord(n: Vec3) -> Vec2 {
    Vec2::new(
        0.5 + n.z.atan2(n.x) / (2.0 * PI),
        0.5 - n.y.clamp(-1.0, 1.0).asin() / PI,
    )
}
