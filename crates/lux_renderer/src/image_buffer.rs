//! Render targets.

use lux_core::ToneMapperSettings;
use lux_math::Color;

use crate::tonemap::tone_map;

/// Write-only pixel sink fed by [`trace`](crate::trace).
///
/// Pixels are addressed by their row-major index in the full frame.
pub trait RenderTarget {
    fn set_pixel(&mut self, index: usize, color: Color);
}

/// Linear floating point image.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; (width * height) as usize],
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Tone mapped copy as RGBA bytes.
    pub fn to_rgba8(&self, settings: &ToneMapperSettings) -> Vec<u8> {
        let mut mapped = self.pixels.clone();
        tone_map(settings, &mut mapped);
        mapped.iter().flat_map(|color| color.to_rgba8()).collect()
    }

    /// Tone mapped copy for encoding with the `image` crate.
    pub fn to_rgba_image(&self, settings: &ToneMapperSettings) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8(settings))
    }

    /// Linear channels in RGBA order, four floats per pixel.
    pub fn as_rgba_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Unmapped linear copy for HDR formats such as OpenEXR.
    pub fn to_rgba32f_image(&self) -> Option<image::Rgba32FImage> {
        image::Rgba32FImage::from_raw(self.width, self.height, self.as_rgba_f32().to_vec())
    }
}

impl RenderTarget for ImageBuffer {
    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_core::ToneMapperKind;

    #[test]
    fn test_set_pixel_by_index() {
        let mut buffer = ImageBuffer::new(4, 2);
        buffer.set_pixel(5, Color::RED);
        assert_eq!(buffer.get(1, 1), Color::RED);

        // Out of range writes are ignored
        buffer.set_pixel(100, Color::RED);
        assert_eq!(buffer.pixel_count(), 8);
    }

    #[test]
    fn test_rgba_conversion() {
        let mut buffer = ImageBuffer::new(2, 1);
        buffer.set(0, 0, Color::WHITE);
        let settings = ToneMapperSettings {
            kind: ToneMapperKind::Linear,
            apply_gamma: false,
            ..ToneMapperSettings::default()
        };

        let bytes = buffer.to_rgba8(&settings);
        assert_eq!(bytes, vec![255, 255, 255, 255, 0, 0, 0, 255]);

        let image = buffer.to_rgba_image(&settings).expect("image");
        assert_eq!(image.dimensions(), (2, 1));
    }

    #[test]
    fn test_linear_float_export() {
        let mut buffer = ImageBuffer::new(2, 1);
        buffer.set(1, 0, Color::new(2.5, 0.5, 0.0));

        assert_eq!(buffer.as_rgba_f32(), &[0.0, 0.0, 0.0, 1.0, 2.5, 0.5, 0.0, 1.0]);

        let image = buffer.to_rgba32f_image().expect("image");
        assert_eq!(image.dimensions(), (2, 1));
        // Values above one survive without tone mapping
        assert_eq!(image.get_pixel(1, 0).0, [2.5, 0.5, 0.0, 1.0]);
    }
}
