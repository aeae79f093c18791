//! Camera for primary ray generation.

use lux_math::{EulerAngle, Mat4, Ray, Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraProjection {
    #[default]
    Perspective,
    Orthographic,
    /// Equidistant fisheye; pixels outside the lens circle get no ray.
    Fisheye,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: EulerAngle,
    pub projection: CameraProjection,
    /// Horizontal field of view in degrees.
    pub fov: f32,
    /// Width of the view in world units for the orthographic projection.
    pub orthographic_size: f32,
    /// Full opening angle of the fisheye lens in degrees.
    pub fisheye_angle: f32,
    /// Thin lens diameter, zero for a pinhole.
    pub aperture_size: f32,
    pub focal_distance: f32,

    // Set by initialize()
    #[serde(skip)]
    right: Vec3,
    #[serde(skip)]
    up: Vec3,
    #[serde(skip)]
    forward: Vec3,
    #[serde(skip)]
    image_width: f32,
    #[serde(skip)]
    image_height: f32,
    #[serde(skip)]
    image_plane_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            orientation: EulerAngle::ZERO,
            projection: CameraProjection::Perspective,
            fov: 75.0,
            orthographic_size: 10.0,
            fisheye_angle: 180.0,
            aperture_size: 0.0,
            focal_distance: 10.0,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::NEG_Z,
            image_width: 1.0,
            image_height: 1.0,
            image_plane_distance: 1.0,
        };
        camera.initialize();
        camera
    }
}

impl Camera {
    pub fn new(position: Vec3, orientation: EulerAngle, fov: f32) -> Self {
        let mut camera = Self {
            position,
            orientation,
            fov,
            ..Self::default()
        };
        camera.initialize();
        camera
    }

    /// Point the camera at `target` (roll is cleared).
    pub fn look_at(&mut self, target: Vec3) {
        let direction = target - self.position;
        if direction.length_squared() > 0.0 {
            self.orientation = EulerAngle::from_direction(direction);
        }
        self.initialize();
    }

    /// Recompute the basis from position and orientation.
    pub fn initialize(&mut self) {
        let rotation: Mat4 = self.orientation.rotation_matrix();
        self.right = rotation.transform_vector3(Vec3::X).normalize();
        self.up = rotation.transform_vector3(Vec3::Y).normalize();
        self.forward = rotation.transform_vector3(Vec3::NEG_Z).normalize();
        self.update_image_plane();
    }

    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.image_width = width.max(1) as f32;
        self.image_height = height.max(1) as f32;
        self.update_image_plane();
    }

    fn update_image_plane(&mut self) {
        let half_fov = (self.fov.clamp(1.0, 179.0) * 0.5).to_radians();
        self.image_plane_distance = (self.image_width * 0.5) / half_fov.tan();
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Ray through `pixel`, given in pixel coordinates with the origin at
    /// the top-left corner (pixel centers sit at `+0.5`). `lens_sample`
    /// is a point on the unit disc used for depth of field.
    ///
    /// Returns `None` for fisheye pixels outside the lens.
    pub fn generate_ray(&self, pixel: Vec2, lens_sample: Vec2) -> Option<Ray> {
        let dx = pixel.x - self.image_width * 0.5;
        let dy = self.image_height * 0.5 - pixel.y;

        match self.projection {
            CameraProjection::Perspective => {
                let direction =
                    (self.forward * self.image_plane_distance + self.right * dx + self.up * dy).normalize();

                if self.aperture_size <= 0.0 {
                    return Some(Ray::new(self.position, direction));
                }

                let focal_point = self.position + direction * (self.focal_distance / direction.dot(self.forward));
                let lens = lens_sample * (self.aperture_size * 0.5);
                let origin = self.position + self.right * lens.x + self.up * lens.y;
                Some(Ray::new(origin, focal_point - origin))
            }
            CameraProjection::Orthographic => {
                let scale = self.orthographic_size / self.image_width;
                let origin = self.position + self.right * (dx * scale) + self.up * (dy * scale);
                Some(Ray::new(origin, self.forward))
            }
            CameraProjection::Fisheye => {
                let radius = 0.5 * self.image_width.min(self.image_height);
                let n = Vec2::new(dx, dy) / radius;
                let r = n.length();
                if r > 1.0 {
                    return None;
                }

                let theta = r * (self.fisheye_angle * 0.5).to_radians();
                let phi = n.y.atan2(n.x);
                let direction = self.forward * theta.cos()
                    + (self.right * phi.cos() + self.up * phi.sin()) * theta.sin();
                Some(Ray::new(self.position, direction))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn camera(projection: CameraProjection) -> Camera {
        let mut camera = Camera::new(Vec3::ZERO, EulerAngle::ZERO, 90.0);
        camera.projection = projection;
        camera.set_image_size(100, 100);
        camera
    }

    #[test]
    fn test_center_ray_looks_forward() {
        let camera = camera(CameraProjection::Perspective);
        let ray = camera.generate_ray(Vec2::new(50.0, 50.0), Vec2::ZERO).expect("ray");
        assert!(close(ray.direction, Vec3::NEG_Z));
    }

    #[test]
    fn test_horizontal_fov() {
        let camera = camera(CameraProjection::Perspective);
        // Right edge of a 90 degree view is 45 degrees off axis
        let ray = camera.generate_ray(Vec2::new(100.0, 50.0), Vec2::ZERO).expect("ray");
        assert!(close(ray.direction, Vec3::new(1.0, 0.0, -1.0).normalize()));

        // Top of the image is +Y
        let ray = camera.generate_ray(Vec2::new(50.0, 0.0), Vec2::ZERO).expect("ray");
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_orthographic_rays_are_parallel() {
        let camera = camera(CameraProjection::Orthographic);
        let a = camera.generate_ray(Vec2::new(0.0, 50.0), Vec2::ZERO).expect("ray");
        let b = camera.generate_ray(Vec2::new(100.0, 50.0), Vec2::ZERO).expect("ray");
        assert_eq!(a.direction, b.direction);
        assert!((b.origin.x - a.origin.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_fisheye_off_lens() {
        let camera = camera(CameraProjection::Fisheye);
        assert!(camera.generate_ray(Vec2::new(0.0, 0.0), Vec2::ZERO).is_none());

        let edge = camera.generate_ray(Vec2::new(100.0, 50.0), Vec2::ZERO).expect("ray");
        assert!(close(edge.direction, Vec3::X));
    }

    #[test]
    fn test_depth_of_field_converges_on_focal_plane() {
        let mut camera = camera(CameraProjection::Perspective);
        camera.aperture_size = 1.0;
        camera.focal_distance = 5.0;

        let a = camera.generate_ray(Vec2::new(60.0, 40.0), Vec2::new(1.0, 0.0)).expect("ray");
        let b = camera.generate_ray(Vec2::new(60.0, 40.0), Vec2::new(-1.0, 0.5)).expect("ray");
        assert!(!close(a.origin, b.origin));

        let pa = a.at((-5.0 - a.origin.z) / a.direction.z);
        let pb = b.at((-5.0 - b.origin.z) / b.direction.z);
        assert!(close(pa, pb));
    }

    #[test]
    fn test_look_at() {
        let mut camera = Camera::new(Vec3::new(0.0, 6.0, 0.0), EulerAngle::ZERO, 45.0);
        camera.look_at(Vec3::ZERO);
        assert!(close(camera.forward(), Vec3::NEG_Y));
    }
}
