//! Linear RGBA color.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Linear RGBA color with `f32` channels.
///
/// Arithmetic operates on the RGB channels and keeps the left operand's
/// alpha, which is what shading code wants when summing light
/// contributions.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    /// Opaque color from RGB.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Gray level with all three channels set to `v`.
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Decode a packed `0xRRGGBBAA` value.
    pub fn from_rgba_u32(rgba: u32) -> Self {
        Self::with_alpha(
            ((rgba >> 24) & 0xff) as f32 / 255.0,
            ((rgba >> 16) & 0xff) as f32 / 255.0,
            ((rgba >> 8) & 0xff) as f32 / 255.0,
            (rgba & 0xff) as f32 / 255.0,
        )
    }

    /// Relative luminance (Rec. 709 weights).
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    /// All channels clamped to [0, 1].
    pub fn clamped(&self) -> Color {
        Color::with_alpha(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// RGB channels raised to `exponent` (gamma encode/decode).
    pub fn pow(&self, exponent: f32) -> Color {
        Color::with_alpha(
            self.r.max(0.0).powf(exponent),
            self.g.max(0.0).powf(exponent),
            self.b.max(0.0).powf(exponent),
            self.a,
        )
    }

    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 1.0
    }

    /// Linear interpolation, `t = 0` gives `start`.
    pub fn lerp(start: Color, end: Color, t: f32) -> Color {
        Color::with_alpha(
            start.r + (end.r - start.r) * t,
            start.g + (end.g - start.g) * t,
            start.b + (end.b - start.b) * t,
            start.a + (end.a - start.a) * t,
        )
    }

    /// Source-over blend of `top` onto `bottom` using the alpha of `top`.
    pub fn alpha_blend(bottom: Color, top: Color) -> Color {
        let alpha = top.a.clamp(0.0, 1.0);
        let mut blended = Color::lerp(bottom, top, alpha);
        blended.a = alpha + bottom.a * (1.0 - alpha);
        blended
    }

    /// Per-channel exponential decay, `exp(-factor * distance)`.
    pub fn attenuation(factor: f32, distance: f32) -> f32 {
        (-factor * distance).exp()
    }

    pub fn max_channel(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// Convert to 8-bit RGBA without any tone mapping.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let c = self.clamped();
        [
            (c.r * 255.0 + 0.5) as u8,
            (c.g * 255.0 + 0.5) as u8,
            (c.b * 255.0 + 0.5) as u8,
            (c.a * 255.0 + 0.5) as u8,
        ]
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::with_alpha(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        Color::with_alpha(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b, self.a)
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color::with_alpha(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a)
    }
}

impl MulAssign for Color {
    fn mul_assign(&mut self, rhs: Color) {
        self.r *= rhs.r;
        self.g *= rhs.g;
        self.b *= rhs.b;
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Color {
        Color::with_alpha(self.r * rhs, self.g * rhs, self.b * rhs, self.a)
    }
}

impl Mul<Color> for f32 {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        rhs * self
    }
}

impl MulAssign<f32> for Color {
    fn mul_assign(&mut self, rhs: f32) {
        self.r *= rhs;
        self.g *= rhs;
        self.b *= rhs;
    }
}

impl Div<f32> for Color {
    type Output = Color;

    fn div(self, rhs: f32) -> Color {
        Color::with_alpha(self.r / rhs, self.g / rhs, self.b / rhs, self.a)
    }
}

impl DivAssign<f32> for Color {
    fn div_assign(&mut self, rhs: f32) {
        self.r /= rhs;
        self.g /= rhs;
        self.b /= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_luminance_of_white_is_one() {
        assert_abs_diff_eq!(Color::WHITE.luminance(), 1.0, epsilon = 1e-5);
        assert_eq!(Color::BLACK.luminance(), 0.0);
    }

    #[test]
    fn test_clamped() {
        let c = Color::with_alpha(-1.0, 0.5, 2.0, 3.0).clamped();
        assert_eq!(c, Color::with_alpha(0.0, 0.5, 1.0, 1.0));
    }

    #[test]
    fn test_gamma_pow() {
        let c = Color::gray(0.25).pow(0.5);
        assert_abs_diff_eq!(c.r, 0.5, epsilon = 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_alpha_blend() {
        let top = Color::with_alpha(1.0, 0.0, 0.0, 0.25);
        let blended = Color::alpha_blend(Color::BLUE, top);
        assert_abs_diff_eq!(blended.r, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(blended.b, 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(blended.a, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_rgba_u32() {
        let c = Color::from_rgba_u32(0xff0080ff);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert_abs_diff_eq!(c.b, 128.0 / 255.0, epsilon = 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_arithmetic_keeps_alpha() {
        let a = Color::with_alpha(0.1, 0.2, 0.3, 0.5);
        let sum = a + Color::WHITE * 0.5;
        assert_abs_diff_eq!(sum.g, 0.7, epsilon = 1e-6);
        assert_eq!(sum.a, 0.5);
    }

    #[test]
    fn test_to_rgba8() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::gray(2.0).to_rgba8(), [255, 255, 255, 255]);
    }
}
