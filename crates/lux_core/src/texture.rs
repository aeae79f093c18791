//! Procedural and image textures.
//!
//! A texture maps a surface point (world position plus texture coordinates)
//! to a color. Materials use textures in place of their flat colors, and as
//! normal, height and mask maps through `value_at` and `normal_at`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lux_math::{Color, Vec2, Vec3};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin, Value};
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;
use crate::image::{Image, ImagePool};

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Texture {
    pub id: u32,
    /// Multiplier applied to every color the texture returns.
    #[serde(default = "one")]
    pub intensity: f32,
    #[serde(flatten)]
    pub kind: TextureKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextureKind {
    Color {
        color: Color,
    },
    /// 3D checkerboard over world position.
    CheckerSolid {
        color1: Color,
        color2: Color,
        length: f32,
    },
    ColorGradient {
        gradient: ColorGradient,
        #[serde(default)]
        along_v: bool,
    },
    Image {
        path: PathBuf,
        /// Decode the image as sRGB.
        #[serde(default)]
        apply_gamma: bool,
        #[serde(skip)]
        image: Option<Arc<Image>>,
    },
    /// Fractal noise blended between two colors.
    Noise {
        noise: FractalNoise,
        low: Color,
        high: Color,
    },
    /// Distance to the nearest cell feature point.
    CellNoise {
        cells: CellNoise,
        low: Color,
        high: Color,
    },
    Marble {
        noise: FractalNoise,
        color1: Color,
        color2: Color,
        stripes: f32,
        turbulence: f32,
    },
    Wood {
        noise: FractalNoise,
        light: Color,
        dark: Color,
        ring_count: f32,
        turbulence: f32,
    },
    /// Noise mapped through a gradient and faded out towards `v = 1`.
    Fire {
        noise: FractalNoise,
        gradient: ColorGradient,
    },
    /// Clouds over a horizon-to-zenith sky gradient.
    Atmosphere {
        noise: FractalNoise,
        horizon: Color,
        zenith: Color,
        cloud_color: Color,
        /// Noise level above which clouds appear, in [0, 1].
        cloud_cover: f32,
        cloud_sharpness: f32,
    },
    /// Each cell gets one of `colors`.
    Voronoi {
        cells: CellNoise,
        colors: Vec<Color>,
    },
}

impl Texture {
    pub fn new(id: u32, kind: TextureKind) -> Self {
        Self {
            id,
            intensity: 1.0,
            kind,
        }
    }

    pub fn color(id: u32, color: Color) -> Self {
        Self::new(id, TextureKind::Color { color })
    }

    /// Image texture backed by a decoded image, bypassing the pool.
    pub fn from_image(id: u32, image: Image) -> Self {
        Self::new(
            id,
            TextureKind::Image {
                path: PathBuf::new(),
                apply_gamma: false,
                image: Some(Arc::new(image)),
            },
        )
    }

    /// Load image data. Other kinds need no preparation.
    pub fn initialize(&mut self, pool: &mut ImagePool) -> SceneResult<()> {
        if let TextureKind::Image {
            path,
            apply_gamma,
            image,
        } = &mut self.kind
        {
            if image.is_none() {
                *image = Some(pool.load(path, *apply_gamma)?);
            }
        }
        Ok(())
    }

    pub fn color_at(&self, position: Vec3, texcoord: Vec2) -> Color {
        let color = match &self.kind {
            TextureKind::Color { color } => *color,
            TextureKind::CheckerSolid {
                color1,
                color2,
                length,
            } => {
                let cell = (position / length.max(f32::MIN_POSITIVE)).floor();
                if (cell.x + cell.y + cell.z).rem_euclid(2.0) < 1.0 {
                    *color1
                } else {
                    *color2
                }
            }
            TextureKind::ColorGradient { gradient, along_v } => {
                gradient.color_at(if *along_v { texcoord.y } else { texcoord.x })
            }
            TextureKind::Image { image, .. } => image
                .as_ref()
                .map_or(Color::BLACK, |image| image.sample(texcoord.x, texcoord.y)),
            TextureKind::Noise { noise, low, high } => Color::lerp(*low, *high, noise.value(position)),
            TextureKind::CellNoise { cells, low, high } => {
                Color::lerp(*low, *high, cells.nearest(position).distance.min(1.0))
            }
            TextureKind::Marble {
                noise,
                color1,
                color2,
                stripes,
                turbulence,
            } => {
                let phase = (position.x + position.y + position.z) * stripes + turbulence * noise.signed(position);
                Color::lerp(*color1, *color2, 0.5 + 0.5 * phase.sin())
            }
            TextureKind::Wood {
                noise,
                light,
                dark,
                ring_count,
                turbulence,
            } => {
                let radius = (position.x * position.x + position.z * position.z).sqrt();
                let rings = radius * ring_count + turbulence * noise.signed(position);
                Color::lerp(*light, *dark, rings.rem_euclid(1.0))
            }
            TextureKind::Fire { noise, gradient } => {
                let height = texcoord.y.clamp(0.0, 1.0);
                gradient.color_at(noise.value(position) * (1.0 - height))
            }
            TextureKind::Atmosphere {
                noise,
                horizon,
                zenith,
                cloud_color,
                cloud_cover,
                cloud_sharpness,
            } => {
                let sky = Color::lerp(*horizon, *zenith, texcoord.y.clamp(0.0, 1.0));
                let density = ((noise.value(position) - cloud_cover) * cloud_sharpness).clamp(0.0, 1.0);
                Color::lerp(sky, *cloud_color, density)
            }
            TextureKind::Voronoi { cells, colors } => {
                if colors.is_empty() {
                    Color::BLACK
                } else {
                    colors[cells.nearest(position).cell_hash as usize % colors.len()]
                }
            }
        };

        color * self.intensity
    }

    /// Scalar value, the luminance of the color.
    pub fn value_at(&self, position: Vec3, texcoord: Vec2) -> f32 {
        self.color_at(position, texcoord).luminance()
    }

    /// Tangent space normal decoded from the color (`2c - 1`).
    pub fn normal_at(&self, position: Vec3, texcoord: Vec2) -> Vec3 {
        let c = self.color_at(position, texcoord);
        Vec3::new(2.0 * c.r - 1.0, 2.0 * c.g - 1.0, 2.0 * c.b - 1.0).normalize_or_zero()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientSegment {
    pub color: Color,
    /// Relative length of the segment ending at `color`.
    pub weight: f32,
}

/// Piecewise linear color ramp over `[0, 1]`.
///
/// The first segment's color is the start of the ramp; every following
/// segment blends towards its color over a share of the range proportional
/// to its weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    pub segments: Vec<GradientSegment>,
}

impl ColorGradient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_segment(mut self, color: Color, weight: f32) -> Self {
        self.segments.push(GradientSegment {
            color,
            weight: weight.max(0.0),
        });
        self
    }

    pub fn color_at(&self, t: f32) -> Color {
        let Some(first) = self.segments.first() else {
            return Color::BLACK;
        };

        let total: f32 = self.segments.iter().skip(1).map(|s| s.weight).sum();
        if total <= 0.0 {
            return first.color;
        }

        let mut position = t.clamp(0.0, 1.0) * total;
        let mut start = first.color;
        for segment in self.segments.iter().skip(1) {
            if position <= segment.weight && segment.weight > 0.0 {
                return Color::lerp(start, segment.color, position / segment.weight);
            }
            position -= segment.weight;
            start = segment.color;
        }
        start
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseBasis {
    #[default]
    Perlin,
    Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub basis: NoiseBasis,
    pub seed: u32,
    pub octaves: usize,
    pub frequency: f64,
    pub lacunarity: f64,
    pub persistence: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            basis: NoiseBasis::Perlin,
            seed: 1,
            octaves: 4,
            frequency: 1.0,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

/// Fractal Brownian motion over Perlin or value noise.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "NoiseSettings", into = "NoiseSettings")]
pub struct FractalNoise {
    settings: NoiseSettings,
    generator: Arc<dyn NoiseFn<f64, 3> + Send + Sync>,
}

impl FractalNoise {
    pub fn new(settings: NoiseSettings) -> Self {
        let generator: Arc<dyn NoiseFn<f64, 3> + Send + Sync> = match settings.basis {
            NoiseBasis::Perlin => Arc::new(
                Fbm::<Perlin>::new(settings.seed)
                    .set_octaves(settings.octaves)
                    .set_frequency(settings.frequency)
                    .set_lacunarity(settings.lacunarity)
                    .set_persistence(settings.persistence),
            ),
            NoiseBasis::Value => Arc::new(
                Fbm::<Value>::new(settings.seed)
                    .set_octaves(settings.octaves)
                    .set_frequency(settings.frequency)
                    .set_lacunarity(settings.lacunarity)
                    .set_persistence(settings.persistence),
            ),
        };
        Self { settings, generator }
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Raw noise, roughly in `[-1, 1]`.
    pub fn signed(&self, p: Vec3) -> f32 {
        self.generator.get([p.x as f64, p.y as f64, p.z as f64]) as f32
    }

    /// Noise remapped to `[0, 1]`.
    pub fn value(&self, p: Vec3) -> f32 {
        (0.5 * (self.signed(p) + 1.0)).clamp(0.0, 1.0)
    }
}

impl Default for FractalNoise {
    fn default() -> Self {
        Self::new(NoiseSettings::default())
    }
}

impl From<NoiseSettings> for FractalNoise {
    fn from(settings: NoiseSettings) -> Self {
        Self::new(settings)
    }
}

impl From<FractalNoise> for NoiseSettings {
    fn from(noise: FractalNoise) -> Self {
        noise.settings
    }
}

impl fmt::Debug for FractalNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FractalNoise")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Nearest feature point lookup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CellSample {
    pub distance: f32,
    pub cell_hash: u32,
}

/// Worley cellular noise with one jittered feature point per unit cell.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellNoise {
    pub seed: u32,
    /// Cells per world unit.
    pub density: f32,
}

impl Default for CellNoise {
    fn default() -> Self {
        Self { seed: 1, density: 1.0 }
    }
}

impl CellNoise {
    pub fn nearest(&self, position: Vec3) -> CellSample {
        let p = position * self.density;
        let base = p.floor();
        let mut best = CellSample {
            distance: f32::INFINITY,
            cell_hash: 0,
        };

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let cell = base + Vec3::new(dx as f32, dy as f32, dz as f32);
                    let hash = cell_hash(cell, self.seed);
                    let feature = cell + jitter(hash);
                    let distance = (feature - p).length();
                    if distance < best.distance {
                        best = CellSample {
                            distance,
                            cell_hash: hash,
                        };
                    }
                }
            }
        }

        best
    }
}

fn cell_hash(cell: Vec3, seed: u32) -> u32 {
    let mut h = seed.wrapping_mul(0x9E37_79B9);
    for component in [cell.x as i32, cell.y as i32, cell.z as i32] {
        h ^= (component as u32).wrapping_mul(0x85EB_CA6B);
        h = h.rotate_left(13).wrapping_mul(0xC2B2_AE35);
    }
    h ^= h >> 16;
    h
}

/// Feature point offset inside the unit cell.
fn jitter(hash: u32) -> Vec3 {
    let unit = |shift: u32| ((hash.rotate_left(shift) & 0x3ff) as f32 + 0.5) / 1024.0;
    Vec3::new(unit(0), unit(10), unit(20))
}
