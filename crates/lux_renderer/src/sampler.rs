//! 2D sample patterns and their mappings to discs and hemispheres.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use lux_core::SamplerKind;
use lux_math::{Vec2, Vec3};
use rand::{Rng, RngCore};

/// Generates `n × n` points in the unit square.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Sampler {
    pub kind: SamplerKind,
}

impl Sampler {
    pub fn new(kind: SamplerKind) -> Self {
        Self { kind }
    }

    /// `n × n` samples in `[0, 1)²`. `Center` always returns the single
    /// point `(0.5, 0.5)`.
    pub fn square_samples(&self, n: u32, rng: &mut dyn RngCore) -> Vec<Vec2> {
        let n = n.max(1);
        let cell = 1.0 / n as f32;

        match self.kind {
            SamplerKind::Center => vec![Vec2::splat(0.5)],
            SamplerKind::Random => (0..n * n).map(|_| Vec2::new(rng.gen(), rng.gen())).collect(),
            SamplerKind::Regular => grid(n)
                .map(|(x, y)| Vec2::new((x as f32 + 0.5) * cell, (y as f32 + 0.5) * cell))
                .collect(),
            SamplerKind::Jittered => grid(n)
                .map(|(x, y)| {
                    Vec2::new(
                        (x as f32 + rng.gen::<f32>()) * cell,
                        (y as f32 + rng.gen::<f32>()) * cell,
                    )
                })
                .collect(),
        }
    }

    /// `n × n` samples on the unit disc.
    pub fn disc_samples(&self, n: u32, rng: &mut dyn RngCore) -> Vec<Vec2> {
        self.square_samples(n, rng).into_iter().map(square_to_disc).collect()
    }

    /// `n × n` cosine weighted directions around `+Z`.
    pub fn hemisphere_samples(&self, n: u32, rng: &mut dyn RngCore) -> Vec<Vec3> {
        self.square_samples(n, rng)
            .into_iter()
            .map(square_to_cosine_hemisphere)
            .collect()
    }
}

fn grid(n: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..n).flat_map(move |y| (0..n).map(move |x| (x, y)))
}

/// Shirley-Chiu concentric mapping of the unit square onto the unit disc.
pub fn square_to_disc(sample: Vec2) -> Vec2 {
    let offset = sample * 2.0 - Vec2::ONE;
    if offset == Vec2::ZERO {
        return Vec2::ZERO;
    }

    let (radius, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    Vec2::new(theta.cos(), theta.sin()) * radius
}

/// Cosine weighted direction on the `+Z` hemisphere.
pub fn square_to_cosine_hemisphere(sample: Vec2) -> Vec3 {
    let d = square_to_disc(sample);
    let z = (1.0 - d.length_squared()).max(0.0).sqrt();
    Vec3::new(d.x, d.y, z)
}

/// Uniform direction on the `+Z` hemisphere.
pub fn square_to_uniform_hemisphere(sample: Vec2) -> Vec3 {
    let z = sample.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * sample.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        for kind in [SamplerKind::Random, SamplerKind::Regular, SamplerKind::Jittered] {
            assert_eq!(Sampler::new(kind).square_samples(3, &mut rng).len(), 9);
        }
        assert_eq!(Sampler::new(SamplerKind::Center).square_samples(3, &mut rng), vec![Vec2::splat(0.5)]);
    }

    #[test]
    fn test_jittered_samples_are_stratified() {
        let mut rng = StdRng::seed_from_u64(2);
        let samples = Sampler::new(SamplerKind::Jittered).square_samples(4, &mut rng);
        for (i, s) in samples.iter().enumerate() {
            let (x, y) = ((i % 4) as f32, (i / 4) as f32);
            assert!(s.x >= x * 0.25 && s.x < (x + 1.0) * 0.25);
            assert!(s.y >= y * 0.25 && s.y < (y + 1.0) * 0.25);
        }
    }

    #[test]
    fn test_regular_samples() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples = Sampler::new(SamplerKind::Regular).square_samples(2, &mut rng);
        assert_eq!(samples[0], Vec2::splat(0.25));
        assert_eq!(samples[3], Vec2::splat(0.75));
    }

    #[test]
    fn test_mappings_stay_in_domain() {
        let mut rng = StdRng::seed_from_u64(4);
        let sampler = Sampler::new(SamplerKind::Random);

        for d in sampler.disc_samples(8, &mut rng) {
            assert!(d.length() <= 1.0 + 1e-5);
        }
        for h in sampler.hemisphere_samples(8, &mut rng) {
            assert!(h.z >= 0.0);
            assert!((h.length() - 1.0).abs() < 1e-4);
        }
        assert_eq!(square_to_disc(Vec2::splat(0.5)), Vec2::ZERO);
        assert!((square_to_uniform_hemisphere(Vec2::new(0.3, 0.6)).length() - 1.0).abs() < 1e-5);
    }
}
