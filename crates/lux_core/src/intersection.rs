use lux_math::{Onb, Ray, Vec2, Vec3};

/// Whether a crossing enters or leaves the solid it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CrossingDirection {
    #[default]
    In,
    Out,
}

/// Record of a ray-surface crossing.
///
/// The stored normal always faces against the incoming ray; `direction`
/// keeps track of which side of the surface was hit.
#[derive(Debug, Copy, Clone)]
pub struct Intersection {
    pub was_found: bool,
    pub distance: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
    /// Tangent frame, `onb.w` equals `normal`.
    pub onb: Onb,
    /// Id of the primitive that owns the hit.
    pub primitive_id: Option<u32>,
    /// Index into `Scene::materials`.
    pub material: Option<usize>,
    pub direction: CrossingDirection,
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            was_found: false,
            distance: f32::INFINITY,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            texcoord: Vec2::ZERO,
            onb: Onb::UP,
            primitive_id: None,
            material: None,
            direction: CrossingDirection::In,
        }
    }
}

impl Intersection {
    /// Fill the geometric part of a hit at `distance` along `ray`.
    ///
    /// `outward_normal` points out of the solid; it is flipped to face the
    /// ray and the crossing direction is derived from it.
    pub fn set_hit(&mut self, ray: &Ray, distance: f32, outward_normal: Vec3) {
        self.was_found = true;
        self.distance = distance;
        self.position = ray.at(distance);

        if ray.direction.dot(outward_normal) < 0.0 {
            self.direction = CrossingDirection::In;
            self.normal = outward_normal;
        } else {
            self.direction = CrossingDirection::Out;
            self.normal = -outward_normal;
        }
        self.onb = Onb::from_normal(self.normal);
    }

    /// Rebuild the tangent frame around the current normal, aligning the
    /// tangent with `tangent` when possible.
    pub fn set_tangent(&mut self, tangent: Vec3) {
        self.onb = Onb::from_normal_and_tangent(self.normal, tangent);
    }

    /// True if a hit at `t` is inside the ray interval and closer than the
    /// current one.
    #[inline]
    pub fn accepts(&self, ray: &Ray, t: f32) -> bool {
        ray.accepts(t) && t < self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let isect = Intersection::default();
        assert!(!isect.was_found);
        assert!(isect.distance.is_infinite());
    }

    #[test]
    fn test_set_hit_flips_normal_towards_ray() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let mut isect = Intersection::default();

        isect.set_hit(&ray, 2.0, Vec3::NEG_X);
        assert_eq!(isect.direction, CrossingDirection::In);
        assert_eq!(isect.normal, Vec3::NEG_X);
        assert_eq!(isect.position, Vec3::new(2.0, 0.0, 0.0));

        isect.set_hit(&ray, 3.0, Vec3::X);
        assert_eq!(isect.direction, CrossingDirection::Out);
        assert_eq!(isect.normal, Vec3::NEG_X);
        assert!((isect.onb.w - isect.normal).length() < 1e-6);
    }

    #[test]
    fn test_accepts_respects_ray_interval_and_current_hit() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X);
        ray.min_distance = 0.5;
        ray.max_distance = 10.0;
        let mut isect = Intersection::default();
        assert!(isect.accepts(&ray, 1.0));
        assert!(!isect.accepts(&ray, 0.1));
        assert!(!isect.accepts(&ray, 11.0));

        isect.distance = 4.0;
        assert!(!isect.accepts(&ray, 5.0));
        assert!(isect.accepts(&ray, 3.0));
    }
}
