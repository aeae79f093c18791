//! Scene wide render settings.

use std::str::FromStr;

use lux_math::Color;
use serde::{Deserialize, Serialize};

use crate::bvh::BvhBuildInfo;
use crate::error::SceneError;

/// 2D sample pattern used for pixels, glossiness and area lights.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    Center,
    Random,
    Regular,
    #[default]
    Jittered,
}

impl FromStr for SamplerKind {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(SamplerKind::Center),
            "random" => Ok(SamplerKind::Random),
            "regular" => Ok(SamplerKind::Regular),
            "jittered" => Ok(SamplerKind::Jittered),
            _ => Err(SceneError::unknown("sampler", s)),
        }
    }
}

/// Reconstruction filter for multi-sampled pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    Box,
    Tent,
    Gaussian,
}

impl FromStr for FilterKind {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "box" => Ok(FilterKind::Box),
            "tent" => Ok(FilterKind::Tent),
            "gaussian" => Ok(FilterKind::Gaussian),
            _ => Err(SceneError::unknown("filter", s)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapperKind {
    Passthrough,
    #[default]
    Linear,
    Reinhard,
}

impl FromStr for ToneMapperKind {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passthrough" => Ok(ToneMapperKind::Passthrough),
            "linear" => Ok(ToneMapperKind::Linear),
            "reinhard" => Ok(ToneMapperKind::Reinhard),
            _ => Err(SceneError::unknown("tone mapper", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Recursion limit for reflection and refraction.
    pub max_ray_iterations: u32,
    /// Self-intersection offset for secondary rays.
    pub ray_min_distance: f32,
    pub background_color: Color,
    /// Color of camera rays that miss the lens.
    pub off_lens_color: Color,
    /// Samples per pixel, squared.
    pub pixel_samples: u32,
    pub pixel_sampler: SamplerKind,
    pub pixel_filter: FilterKind,
    /// Pattern for glossy, soft shadow and ambient occlusion samples.
    pub secondary_sampler: SamplerKind,
    pub visualize_depth: bool,
    pub visualize_depth_max_distance: f32,
    pub enable_normal_mapping: bool,
    /// Base seed for per-pixel random generators and random BVH policies.
    pub seed: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            max_ray_iterations: 3,
            ray_min_distance: 1.0e-4,
            background_color: Color::BLACK,
            off_lens_color: Color::BLACK,
            pixel_samples: 1,
            pixel_sampler: SamplerKind::Jittered,
            pixel_filter: FilterKind::Box,
            secondary_sampler: SamplerKind::Jittered,
            visualize_depth: false,
            visualize_depth_max_distance: 25.0,
            enable_normal_mapping: true,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhSettings {
    /// Build a BVH over the visible primitives.
    pub enabled: bool,
    pub build_info: BvhBuildInfo,
}

impl Default for BvhSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            build_info: BvhBuildInfo::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fog {
    pub enabled: bool,
    pub color: Color,
    /// Distance at which fog is total.
    pub distance: f32,
    pub steepness: f32,
    /// Thin the fog out with height.
    pub height_dispersion: bool,
    /// Height above which there is no fog.
    pub height: f32,
    pub height_steepness: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::gray(0.5),
            distance: 100.0,
            steepness: 1.0,
            height_dispersion: false,
            height: 10.0,
            height_steepness: 1.0,
        }
    }
}

impl Fog {
    /// Fog amount in `[0, 1]` for a hit `distance` away at `height`.
    pub fn amount(&self, distance: f32, height: f32) -> f32 {
        if !self.enabled || self.distance <= 0.0 {
            return 0.0;
        }

        let mut t = (distance / self.distance).clamp(0.0, 1.0).powf(self.steepness);
        if self.height_dispersion && self.height > 0.0 {
            let thinning = (height / self.height).clamp(0.0, 1.0).powf(self.height_steepness);
            t *= 1.0 - thinning;
        }
        t
    }

    pub fn apply(&self, color: Color, distance: f32, height: f32) -> Color {
        Color::lerp(color, self.color, self.amount(distance, height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapperSettings {
    pub kind: ToneMapperKind,
    pub apply_gamma: bool,
    pub gamma: f32,
    pub exposure: f32,
    /// Reinhard key value.
    pub key: f32,
}

impl Default for ToneMapperSettings {
    fn default() -> Self {
        Self {
            kind: ToneMapperKind::Linear,
            apply_gamma: true,
            gamma: 2.2,
            exposure: 0.0,
            key: 0.18,
        }
    }
}
