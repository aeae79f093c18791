//! Image loading and caching for image textures.
//!
//! Images are decoded once into linear float RGBA and shared between
//! textures through an `ImagePool`, which a scene owns for the duration of
//! its initialization.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lux_math::Color;
use thiserror::Error;

/// Errors that can occur during image loading.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },

    #[error("Image {0} has no pixels")]
    Empty(PathBuf),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// A decoded image in linear RGBA.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Row-major, top row first.
    pub pixels: Vec<Color>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// 1x1 image of a single color.
    pub fn solid(color: Color) -> Self {
        Self::new(1, 1, vec![color])
    }

    /// Bilinear sample with wrapping. `(0, 0)` is the bottom-left corner.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::BLACK;
        }

        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = (1.0 - v) * (self.height as f32 - 1.0);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x.fract();
        let fy = y.fract();

        let top = Color::lerp(self.pixel(x0, y0), self.pixel(x1, y0), fx);
        let bottom = Color::lerp(self.pixel(x0, y1), self.pixel(x1, y1), fx);
        Color::lerp(top, bottom, fy)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let index = (y * self.width + x) as usize;
        self.pixels.get(index).copied().unwrap_or(Color::BLACK)
    }

    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }
}

/// Cache of decoded images keyed by path and color space.
#[derive(Debug, Default)]
pub struct ImagePool {
    images: HashMap<(PathBuf, bool), Arc<Image>>,
    base_dir: Option<PathBuf>,
}

impl ImagePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool resolving relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Register an already decoded image under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, linearize: bool, image: Image) -> Arc<Image> {
        let image = Arc::new(image);
        self.images.insert((path.into(), linearize), Arc::clone(&image));
        image
    }

    /// Load an image, reusing a cached copy. With `linearize` set the
    /// color channels are converted from sRGB to linear.
    pub fn load(&mut self, path: &Path, linearize: bool) -> ImageResult<Arc<Image>> {
        let key = (path.to_path_buf(), linearize);
        if let Some(image) = self.images.get(&key) {
            return Ok(Arc::clone(image));
        }

        let full_path = self.resolve_path(path);
        let image = Arc::new(load_image_file(&full_path, linearize)?);
        self.images.insert(key, Arc::clone(&image));

        log::debug!(
            "Loaded image: {} ({}x{}, {:.1} KB)",
            full_path.display(),
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn load_image_file(path: &Path, linearize: bool) -> ImageResult<Image> {
    let img = ::image::open(path).map_err(|source| ImageError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Empty(path.to_path_buf()));
    }

    let channel = |value: u8| {
        if linearize {
            srgb_to_linear(value)
        } else {
            value as f32 / 255.0
        }
    };
    let pixels = rgba
        .pixels()
        .map(|p| Color::with_alpha(channel(p[0]), channel(p[1]), channel(p[2]), p[3] as f32 / 255.0))
        .collect();

    Ok(Image::new(width, height, pixels))
}

/// Convert an sRGB byte value to linear float.
pub fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
