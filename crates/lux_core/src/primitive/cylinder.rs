//! Capped cylinder primitive.

use std::f32::consts::PI;

use arrayvec::ArrayVec;
use lux_math::{polynomial, Aabb, Mat3, Mat4, Mat4Ext, Ray, Vec2, Vec3};

use super::Transform;
use crate::intersection::{CrossingDirection, Intersection};

/// A closed cylinder centered at `position`. In its local frame the axis
/// is +Y and the caps lie at `y = ±height / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub position: Vec3,
    pub radius: f32,
    pub height: f32,
    pub rotation: Mat3,
}

/// Candidate crossing in local space.
#[derive(Debug, Copy, Clone)]
struct Crossing {
    t: f32,
    normal: Vec3,
    point: Vec3,
}

impl Cylinder {
    pub fn new(position: Vec3, radius: f32, height: f32) -> Self {
        Self {
            position,
            radius: radius.abs(),
            height: height.abs(),
            rotation: Mat3::IDENTITY,
        }
    }

    /// All surface crossings sorted by distance; a convex solid yields
    /// either none or an entry and an exit.
    fn crossings(&self, ray: &Ray) -> ArrayVec<Crossing, 4> {
        let inverse = self.rotation.transpose();
        let o = inverse * (ray.origin - self.position);
        let d = inverse * ray.direction;
        let half_height = self.height * 0.5;
        let r2 = self.radius * self.radius;

        let mut crossings = ArrayVec::<Crossing, 4>::new();

        // Side wall
        let a = (d.x * d.x + d.z * d.z) as f64;
        let b = 2.0 * (o.x * d.x + o.z * d.z) as f64;
        let c = (o.x * o.x + o.z * o.z - r2) as f64;
        for root in polynomial::solve_quadratic(a, b, c) {
            let t = root as f32;
            let point = o + d * t;
            if point.y.abs() <= half_height {
                let normal = Vec3::new(point.x, 0.0, point.z).normalize_or_zero();
                crossings.push(Crossing { t, normal, point });
            }
        }

        // Caps
        if d.y != 0.0 {
            for cap in [-half_height, half_height] {
                let t = (cap - o.y) / d.y;
                let point = o + d * t;
                if point.x * point.x + point.z * point.z <= r2 && !crossings.is_full() {
                    crossings.push(Crossing {
                        t,
                        normal: Vec3::new(0.0, cap.signum(), 0.0),
                        point,
                    });
                }
            }
        }

        crossings.sort_by(|a, b| a.t.total_cmp(&b.t));
        crossings
    }

    /// Entry and exit crossings, `None` on a miss or if behind the origin.
    fn span_crossings(&self, ray: &Ray) -> Option<(Crossing, Crossing)> {
        let crossings = self.crossings(ray);
        let entry = *crossings.first()?;
        let exit = *crossings.last()?;
        if crossings.len() < 2 || exit.t < 0.0 {
            return None;
        }
        Some((entry, exit))
    }

    fn fill(&self, ray: &Ray, crossing: &Crossing, isect: &mut Intersection) {
        isect.set_hit(ray, crossing.t, self.rotation * crossing.normal);

        let p = crossing.point;
        if crossing.normal.y == 0.0 {
            isect.texcoord = Vec2::new(
                0.5 + p.z.atan2(p.x) / (2.0 * PI),
                (p.y + self.height * 0.5) / self.height.max(f32::MIN_POSITIVE),
            );
            isect.set_tangent(self.rotation * Vec3::new(-p.z, 0.0, p.x));
        } else {
            let diameter = (2.0 * self.radius).max(f32::MIN_POSITIVE);
            isect.texcoord = Vec2::new(p.x / diameter + 0.5, p.z / diameter + 0.5);
            isect.set_tangent(self.rotation * Vec3::X);
        }
    }

    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        let Some((entry, exit)) = self.span_crossings(ray) else {
            return false;
        };

        let crossing = if entry.t >= ray.min_distance { entry } else { exit };
        if !isect.accepts(ray, crossing.t) {
            return false;
        }

        self.fill(ray, &crossing, isect);
        true
    }

    /// Entry and exit crossings regardless of the ray clipping interval.
    pub fn intersect_span(&self, ray: &Ray) -> Option<[Intersection; 2]> {
        let (entry, exit) = self.span_crossings(ray)?;

        let mut entry_isect = Intersection::default();
        self.fill(ray, &entry, &mut entry_isect);
        entry_isect.direction = CrossingDirection::In;

        let mut exit_isect = Intersection::default();
        self.fill(ray, &exit, &mut exit_isect);
        exit_isect.direction = CrossingDirection::Out;

        Some([entry_isect, exit_isect])
    }

    pub fn aabb(&self) -> Aabb {
        let local = Aabb::from_center_extent(
            Vec3::ZERO,
            Vec3::new(2.0 * self.radius, self.height, 2.0 * self.radius),
        );
        let matrix = Mat4::from_translation(self.position) * Mat4::from_mat3(self.rotation);
        matrix.transform_aabb(&local)
    }

    /// Radius follows the X scale and height the Y scale.
    pub fn transform(&mut self, transform: &Transform) {
        self.position = transform.matrix().transform_point3(self.position);
        self.radius *= transform.scale.x.abs();
        self.height *= transform.scale.y.abs();
        self.rotation = transform.rotation() * self.rotation;
    }
}
