use glam::Vec3;

/// Orthonormal basis: tangent `u`, bitangent `v` and normal `w`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Onb {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Default for Onb {
    fn default() -> Self {
        Self::UP
    }
}

impl Onb {
    /// Basis with the normal pointing along +Y.
    pub const UP: Onb = Onb {
        u: Vec3::X,
        v: Vec3::NEG_Z,
        w: Vec3::Y,
    };

    pub fn new(u: Vec3, v: Vec3, w: Vec3) -> Self {
        Self { u, v, w }
    }

    /// Build a basis around `normal`, picking an arbitrary tangent.
    pub fn from_normal(normal: Vec3) -> Self {
        let w = normal.normalize();
        let helper = if w.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
        let u = helper.cross(w).normalize();
        let v = w.cross(u);
        Self { u, v, w }
    }

    /// Build a basis from a normal and a (not necessarily orthogonal)
    /// tangent hint, re-orthogonalized with Gram-Schmidt.
    pub fn from_normal_and_tangent(normal: Vec3, tangent: Vec3) -> Self {
        let w = normal.normalize();
        let projected = tangent - w * tangent.dot(w);
        if projected.length_squared() < 1.0e-12 {
            return Self::from_normal(w);
        }
        let u = projected.normalize();
        let v = w.cross(u);
        Self { u, v, w }
    }

    /// Local (u, v, w) coordinates to world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.u * local.x + self.v * local.y + self.w * local.z
    }

    /// World vector to local (u, v, w) coordinates.
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(world.dot(self.u), world.dot(self.v), world.dot(self.w))
    }

    /// Same basis with the normal (and bitangent) flipped.
    pub fn flipped(&self) -> Self {
        Self {
            u: self.u,
            v: -self.v,
            w: -self.w,
        }
    }
}
