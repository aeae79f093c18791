//! Light sources.

use lux_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
    /// Darken ambient light by hemisphere occlusion.
    pub ambient_occlusion: bool,
    /// Occlusion rays per hit, squared.
    pub occlusion_sample_count: u32,
    /// Occluders farther away than this do not count.
    pub occlusion_distance: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 0.1,
            ambient_occlusion: false,
            occlusion_sample_count: 3,
            occlusion_distance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Direction the light travels in.
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            direction: Vec3::NEG_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Distance at which the light has faded out completely.
    pub max_distance: f32,
    /// Exponent of the falloff `1 - (d / max_distance)^attenuation`.
    pub attenuation: f32,
    /// Sample a disc of `radius` facing the shaded point.
    pub soft_shadows: bool,
    pub radius: f32,
    /// Shadow rays per hit with soft shadows, squared.
    pub sample_count: u32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::ZERO,
            max_distance: 1000.0,
            attenuation: 1.0,
            soft_shadows: false,
            radius: 1.0,
            sample_count: 3,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
            ..Self::default()
        }
    }

    /// Distance falloff in `[0, 1]`.
    pub fn falloff(&self, distance: f32) -> f32 {
        if self.max_distance <= 0.0 {
            return 1.0;
        }
        (1.0 - (distance / self.max_distance).min(1.0).powf(self.attenuation)).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLight {
    #[serde(flatten)]
    pub light: PointLight,
    pub direction: Vec3,
    /// Full cone angle in degrees.
    pub angle: f32,
    /// Exponent shaping the fade towards the cone edge.
    pub side_attenuation: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            light: PointLight::default(),
            direction: Vec3::NEG_Y,
            angle: 45.0,
            side_attenuation: 1.0,
        }
    }
}

impl SpotLight {
    /// Cone falloff for light arriving along `to_point` (from the light to
    /// the shaded point, normalized). Zero outside the cone.
    pub fn cone_falloff(&self, to_point: Vec3) -> f32 {
        let half_angle = (self.angle * 0.5).to_radians();
        let cos_edge = half_angle.cos();
        let cos_angle = to_point.dot(self.direction.normalize_or_zero());
        if cos_angle < cos_edge {
            return 0.0;
        }
        let t = ((cos_angle - cos_edge) / (1.0 - cos_edge).max(f32::EPSILON)).clamp(0.0, 1.0);
        t.powf(self.side_attenuation)
    }
}

/// All lights of a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
    pub spot: Vec<SpotLight>,
}

impl Lights {
    pub fn count(&self) -> usize {
        self.directional.len() + self.point.len() + self.spot.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_point_falloff() {
        let mut light = PointLight::new(Vec3::ZERO, 1.0);
        light.max_distance = 10.0;
        light.attenuation = 2.0;
        assert_abs_diff_eq!(light.falloff(0.0), 1.0);
        assert_abs_diff_eq!(light.falloff(5.0), 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(light.falloff(20.0), 0.0);
    }

    #[test]
    fn test_spot_cone() {
        let spot = SpotLight {
            angle: 60.0,
            ..SpotLight::default()
        };
        assert_abs_diff_eq!(spot.cone_falloff(Vec3::NEG_Y), 1.0);
        assert_eq!(spot.cone_falloff(Vec3::X), 0.0);
        let edge = Vec3::new(0.342, -0.94, 0.0).normalize();
        assert!(spot.cone_falloff(edge) > 0.0);
        assert!(spot.cone_falloff(edge) < 1.0);
    }

    #[test]
    fn test_lights_from_json() {
        let lights: Lights =
            serde_json::from_str(r#"{ "point": [{ "position": [0.0, 5.0, 0.0] }], "spot": [{ "angle": 30.0 }] }"#)
                .expect("lights");
        assert_eq!(lights.count(), 2);
        assert_eq!(lights.point[0].position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(lights.spot[0].angle, 30.0);
    }
}
