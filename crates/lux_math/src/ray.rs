use crate::Vec3;

/// A ray in 3D space with a clipping interval and query flags.
///
/// The direction is kept normalized so that intersection distances are
/// world-space lengths; `inverse_direction` is cached for the slab test.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inverse_direction: Vec3,
    /// Hits closer than this are ignored (self-intersection offset).
    pub min_distance: f32,
    /// Hits farther than this are ignored.
    pub max_distance: f32,
    pub is_shadow_ray: bool,
    /// Stop at the first hit found instead of the nearest one.
    pub fast_occlusion: bool,
    /// Recursion depth of the ray (camera rays are 0).
    pub iteration: u32,
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let mut ray = Self {
            origin,
            direction,
            inverse_direction: Vec3::ZERO,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            is_shadow_ray: false,
            fast_occlusion: false,
            iteration: 0,
        };
        ray.precalculate();
        ray
    }

    /// Occlusion probe from `origin` towards `direction`, clipped to
    /// `[min_distance, max_distance]`.
    pub fn shadow(origin: Vec3, direction: Vec3, min_distance: f32, max_distance: f32) -> Self {
        let mut ray = Self::new(origin, direction);
        ray.min_distance = min_distance;
        ray.max_distance = max_distance;
        ray.is_shadow_ray = true;
        ray.fast_occlusion = true;
        ray
    }

    /// Re-normalize the direction and refresh the cached inverse.
    ///
    /// Axis-parallel directions produce infinite inverse components, which
    /// the slab test handles explicitly.
    pub fn precalculate(&mut self) {
        self.direction = self.direction.normalize();
        self.inverse_direction = Vec3::ONE / self.direction;
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True if `t` lies inside the clipping interval.
    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        t >= self.min_distance && t <= self.max_distance
    }
}
