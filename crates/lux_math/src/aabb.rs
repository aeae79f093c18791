use crate::{scale_rotate_translate, EulerAngle, Mat4Ext, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// `EMPTY` uses `+inf`/`-inf` sentinels so that expanding it by any box
/// yields exactly that box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered at `center` with full side lengths `extent`.
    pub fn from_center_extent(center: Vec3, extent: Vec3) -> Self {
        let half = extent * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing all `vertices`.
    pub fn from_points(vertices: &[Vec3]) -> Self {
        vertices.iter().fold(Self::EMPTY, |mut aabb, v| {
            aabb.expand_point(*v);
            aabb
        })
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Grow to include `other`.
    pub fn expand(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// `2 * (ex*ey + ey*ez + ex*ez)`; zero for an empty box.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.extent();
        2.0 * (e.x * e.y + e.y * e.z + e.x * e.z)
    }

    /// Slab test against `ray` using its cached inverse direction.
    ///
    /// Axis-parallel rays give infinite inverse components. When such a ray
    /// also starts exactly on a slab plane, `0 * inf` is NaN; the axis then
    /// cannot reject the ray and is skipped.
    pub fn intersects(&self, ray: &Ray) -> bool {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            let inv = ray.inverse_direction[axis];
            let t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let t1 = (self.max[axis] - ray.origin[axis]) * inv;
            if t0.is_nan() || t1.is_nan() {
                continue;
            }
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            tmin = tmin.max(near);
            tmax = tmax.min(far);
        }

        tmax >= tmin.max(0.0)
    }

    /// Index of the longest axis. Y wins a tie with X; Z wins only when
    /// strictly longer than both.
    pub fn largest_axis(&self) -> usize {
        let e = self.extent();
        if e.z > e.x && e.z > e.y {
            2
        } else if e.y >= e.x {
            1
        } else {
            0
        }
    }

    /// Conservative bound after scaling and rotating about the box center
    /// and translating by `translate`.
    pub fn transformed(&self, scale: Vec3, rotate: EulerAngle, translate: Vec3) -> Aabb {
        let center = self.center();
        let matrix = scale_rotate_translate(center, scale, rotate, translate);
        matrix.transform_aabb(self)
    }

    /// Translate (move) the AABB by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::from_min_max(self.min + offset, self.max + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_values() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.center(), Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.extent(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.surface_area(), 22.0);
    }

    #[test]
    fn test_from_center_extent() {
        let aabb = Aabb::from_center_extent(Vec3::ONE, Vec3::splat(2.0));
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::splat(2.0));
    }

    #[test]
    fn test_expand_from_empty() {
        let mut aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());
        let other = Aabb::from_min_max(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 3.0));
        aabb.expand(&other);
        assert_eq!(aabb, other);
    }

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(0.0, 0.0, -4.0),
        ]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
    }

    #[test]
    fn test_slab_hit_and_miss() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);

        let ray = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z);
        assert!(aabb.intersects(&ray));

        let ray = Ray::new(Vec3::new(5.0, 0.5, -5.0), Vec3::Z);
        assert!(!aabb.intersects(&ray));
    }

    #[test]
    fn test_slab_ray_pointing_away() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::NEG_Z);
        assert!(!aabb.intersects(&ray));
    }

    #[test]
    fn test_slab_origin_inside() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::splat(0.5), Vec3::new(1.0, 1.0, 0.0));
        assert!(aabb.intersects(&ray));
    }

    #[test]
    fn test_slab_origin_on_boundary_plane() {
        // Origin lies exactly on the x = 0 slab while the ray is parallel to it
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.5, -2.0), Vec3::Z);
        assert!(aabb.intersects(&ray));
    }

    #[test]
    fn test_largest_axis_ties() {
        let aabb_x = Aabb::from_min_max(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(aabb_x.largest_axis(), 0);

        let aabb_z = Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(aabb_z.largest_axis(), 2);

        let tie_xy = Aabb::from_min_max(Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(tie_xy.largest_axis(), 1);

        let tie_xz = Aabb::from_min_max(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0));
        assert_eq!(tie_xz.largest_axis(), 0);

        let cube = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        assert_eq!(cube.largest_axis(), 1);
    }

    #[test]
    fn test_transformed_contains_rotated_box() {
        let aabb = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE);
        let rotated = aabb.transformed(Vec3::ONE, EulerAngle::new(0.0, 45.0, 0.0), Vec3::ZERO);
        let half_diagonal = 2.0_f32.sqrt();
        assert!((rotated.max.x - half_diagonal).abs() < 1e-4);
        assert!((rotated.max.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_transformed_scale_and_translate() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(2.0));
        let moved = aabb.transformed(Vec3::splat(2.0), EulerAngle::ZERO, Vec3::new(5.0, 0.0, 0.0));
        assert!((moved.min - Vec3::new(4.0, -1.0, -1.0)).length() < 1e-5);
        assert!((moved.max - Vec3::new(8.0, 3.0, 3.0)).length() < 1e-5);
    }
}
