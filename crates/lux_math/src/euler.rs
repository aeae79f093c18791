use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Orientation as pitch/yaw/roll in degrees.
///
/// Pitch rotates about X, yaw about Y and roll about Z. The combined
/// rotation applies roll first, then pitch, then yaw, so an identity
/// orientation looks down -Z with +Y up.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EulerAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EulerAngle {
    pub const ZERO: EulerAngle = EulerAngle {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation matrix `Ry(yaw) * Rx(pitch) * Rz(roll)`.
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_z(self.roll.to_radians())
    }

    /// Forward (-Z) direction after rotation.
    pub fn direction(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::NEG_Z)
    }

    /// Orientation (without roll) that looks along `direction`.
    pub fn from_direction(direction: Vec3) -> Self {
        let d = direction.normalize();
        Self {
            pitch: d.y.clamp(-1.0, 1.0).asin().to_degrees(),
            yaw: (-d.x).atan2(-d.z).to_degrees(),
            roll: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.pitch == 0.0 && self.yaw == 0.0 && self.roll == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_identity_looks_down_negative_z() {
        assert!(close(EulerAngle::ZERO.direction(), Vec3::NEG_Z));
    }

    #[test]
    fn test_pitch_down() {
        let angle = EulerAngle::new(-90.0, 0.0, 0.0);
        assert!(close(angle.direction(), Vec3::NEG_Y));
    }

    #[test]
    fn test_yaw_left() {
        let angle = EulerAngle::new(0.0, 90.0, 0.0);
        assert!(close(angle.direction(), Vec3::NEG_X));
    }

    #[test]
    fn test_from_direction_round_trip() {
        let dir = Vec3::new(1.0, -2.0, 3.0).normalize();
        let angle = EulerAngle::from_direction(dir);
        assert!(close(angle.direction(), dir));
    }
}
