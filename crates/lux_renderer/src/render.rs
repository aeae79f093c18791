//! Parallel entry point that turns a range of pixels into colors.
//!
//! Pixels are independent work items fanned out with rayon. Each pixel
//! owns a random generator seeded from the scene seed and its index, so a
//! frame renders identically regardless of thread scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use lux_core::{Camera, Scene};
use lux_math::{Color, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::filter::Filter;
use crate::image_buffer::RenderTarget;
use crate::sampler::Sampler;
use crate::tracer::{TraceStats, WhittedTracer};

/// Golden ratio multiplier that spreads consecutive pixel seeds.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// A contiguous range of row-major pixels of a `width × height` frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    pub scene: &'a Scene,
    pub width: u32,
    pub height: u32,
    pub pixel_offset: usize,
    pub pixel_count: usize,
}

impl<'a> RenderJob<'a> {
    pub fn full_frame(scene: &'a Scene, width: u32, height: u32) -> Self {
        Self {
            scene,
            width,
            height,
            pixel_offset: 0,
            pixel_count: width as usize * height as usize,
        }
    }

    /// The requested range clipped to the frame.
    fn pixel_range(&self) -> std::ops::Range<usize> {
        let total = self.width as usize * self.height as usize;
        let end = self.pixel_offset.saturating_add(self.pixel_count).min(total);
        self.pixel_offset.min(end)..end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceResult {
    pub pixels_processed: u64,
    pub rays_processed: u64,
    /// True if the interrupt flag cut the job short.
    pub interrupted: bool,
}

/// Trace the pixels of `job` into `target`.
///
/// `interrupted` is polled once per pixel; once set, remaining pixels are
/// skipped and the pixels already finished are still written.
pub fn trace(job: &RenderJob, target: &mut dyn RenderTarget, interrupted: &AtomicBool) -> TraceResult {
    let scene = job.scene;
    let range = job.pixel_range();
    let start = Instant::now();

    log::info!(
        "Tracing pixels {}..{} of a {}x{} frame",
        range.start,
        range.end,
        job.width,
        job.height
    );

    let mut camera = scene.camera.clone();
    camera.set_image_size(job.width, job.height);

    let pixel_tracer = PixelTracer {
        tracer: WhittedTracer::new(scene),
        camera,
        sampler: Sampler::new(scene.general.pixel_sampler),
        filter: Filter::new(scene.general.pixel_filter),
        width: job.width.max(1) as usize,
    };

    let pixels: Vec<Option<(usize, Color, TraceStats)>> = range
        .clone()
        .into_par_iter()
        .map(|index| {
            if interrupted.load(Ordering::Relaxed) {
                return None;
            }
            let mut stats = TraceStats::default();
            let color = pixel_tracer.shade(index, &mut stats);
            Some((index, color, stats))
        })
        .collect();

    let mut result = TraceResult::default();
    let mut stats = TraceStats::default();
    for (index, color, pixel_stats) in pixels.into_iter().flatten() {
        target.set_pixel(index, color);
        stats.merge(&pixel_stats);
        result.pixels_processed += 1;
    }
    result.rays_processed = stats.total_rays();
    result.interrupted = result.pixels_processed < range.len() as u64;

    log::info!(
        "Traced {} pixels with {} rays (deepest iteration {}) in {:.2?}{}",
        result.pixels_processed,
        result.rays_processed,
        stats.deepest_iteration,
        start.elapsed(),
        if result.interrupted { ", interrupted" } else { "" }
    );

    result
}

struct PixelTracer<'a> {
    tracer: WhittedTracer<'a>,
    camera: Camera,
    sampler: Sampler,
    filter: Filter,
    width: usize,
}

impl PixelTracer<'_> {
    /// Filtered average of the pixel's `N × N` samples.
    fn shade(&self, index: usize, stats: &mut TraceStats) -> Color {
        let general = &self.tracer.scene().general;
        let x = (index % self.width) as f32;
        let y = (index / self.width) as f32;

        let seed = general.seed.wrapping_add(index as u64).wrapping_mul(SEED_MIX);
        let mut rng = StdRng::seed_from_u64(seed);

        let samples = self.sampler.square_samples(general.pixel_samples, &mut rng);
        let lens = self.sampler.disc_samples(general.pixel_samples, &mut rng);

        let mut sum = Color::BLACK;
        let mut total_weight = 0.0;
        for (i, sample) in samples.iter().enumerate() {
            let weight = self.filter.weight(*sample - Vec2::splat(0.5));
            if weight <= 0.0 {
                continue;
            }

            let lens_sample = lens.get(i).copied().unwrap_or(Vec2::ZERO);
            let color = match self.camera.generate_ray(Vec2::new(x, y) + *sample, lens_sample) {
                Some(ray) => self.tracer.trace(&ray, &mut rng, stats),
                None => general.off_lens_color,
            };
            sum += color * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            sum / total_weight
        } else {
            Color::BLACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buffer::ImageBuffer;
    use approx::assert_abs_diff_eq;
    use lux_core::{CameraProjection, DirectionalLight, Material, Plane, Primitive, PrimitiveKind, SamplerKind, Sphere};
    use lux_math::{EulerAngle, Vec3};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Sphere resting on a ground plane, seen and lit from straight above.
    fn test_scene() -> Scene {
        let mut scene = Scene::default();
        scene.materials.push(Material::diffuse(0, Color::gray(0.3)));
        scene.materials.push(Material::diffuse(1, Color::WHITE));
        scene.add_primitive(Primitive::new(1, 0, PrimitiveKind::Plane(Plane::new(Vec3::ZERO, Vec3::Y))));
        scene.add_primitive(Primitive::new(
            2,
            1,
            PrimitiveKind::Sphere(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0)),
        ));
        scene.lights.directional.push(DirectionalLight {
            direction: Vec3::NEG_Y,
            ..Default::default()
        });
        scene.camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), EulerAngle::new(-90.0, 0.0, 0.0), 30.0);
        scene.general.pixel_sampler = SamplerKind::Center;
        scene.initialize().expect("scene");
        scene
    }

    #[test]
    fn test_full_frame() {
        init_logger();
        let scene = test_scene();
        let flag = AtomicBool::new(false);

        let mut image = ImageBuffer::new(4, 4);
        let result = trace(&RenderJob::full_frame(&scene, 4, 4), &mut image, &flag);
        assert_eq!(result.pixels_processed, 16);
        assert!(result.rays_processed >= 16);
        assert!(!result.interrupted);

        // Center pixels see the sphere, corners only the lit ground
        let sphere = image.get(1, 1).luminance();
        let ground = image.get(0, 0).luminance();
        assert_abs_diff_eq!(ground, 0.33, epsilon = 1e-4);
        assert!(sphere > ground * 1.5, "sphere {sphere}, ground {ground}");

        let mut again = ImageBuffer::new(4, 4);
        trace(&RenderJob::full_frame(&scene, 4, 4), &mut again, &flag);
        assert_eq!(image.pixels, again.pixels);
    }

    #[test]
    fn test_multisampled_frame_is_deterministic() {
        let mut scene = test_scene();
        scene.general.pixel_samples = 3;
        scene.general.pixel_sampler = SamplerKind::Jittered;
        let flag = AtomicBool::new(false);

        let mut first = ImageBuffer::new(8, 8);
        let mut second = ImageBuffer::new(8, 8);
        trace(&RenderJob::full_frame(&scene, 8, 8), &mut first, &flag);
        trace(&RenderJob::full_frame(&scene, 8, 8), &mut second, &flag);
        assert_eq!(first.pixels, second.pixels);
    }

    #[test]
    fn test_interrupted_before_start() {
        let scene = test_scene();
        let mut image = ImageBuffer::new(4, 4);
        image.pixels.fill(Color::RED);
        let flag = AtomicBool::new(true);

        let result = trace(&RenderJob::full_frame(&scene, 4, 4), &mut image, &flag);
        assert_eq!(result.pixels_processed, 0);
        assert_eq!(result.rays_processed, 0);
        assert!(result.interrupted);
        assert!(image.pixels.iter().all(|p| *p == Color::RED));
    }

    #[test]
    fn test_partial_range() {
        let scene = test_scene();
        let mut image = ImageBuffer::new(4, 4);
        image.pixels.fill(Color::RED);
        let flag = AtomicBool::new(false);

        let job = RenderJob {
            pixel_offset: 4,
            pixel_count: 4,
            ..RenderJob::full_frame(&scene, 4, 4)
        };
        let result = trace(&job, &mut image, &flag);
        assert_eq!(result.pixels_processed, 4);

        for (index, pixel) in image.pixels.iter().enumerate() {
            assert_eq!(*pixel == Color::RED, !(4..8).contains(&index), "pixel {index}");
        }

        // Ranges past the end of the frame are clipped
        let past_end = RenderJob {
            pixel_offset: 14,
            pixel_count: 10,
            ..RenderJob::full_frame(&scene, 4, 4)
        };
        assert_eq!(trace(&past_end, &mut image, &flag).pixels_processed, 2);
    }

    #[test]
    fn test_off_lens_pixels() {
        let mut scene = test_scene();
        scene.camera.projection = CameraProjection::Fisheye;
        scene.general.off_lens_color = Color::BLUE;
        let mut image = ImageBuffer::new(4, 4);
        let flag = AtomicBool::new(false);

        trace(&RenderJob::full_frame(&scene, 4, 4), &mut image, &flag);
        assert_eq!(image.get(0, 0), Color::BLUE);
        assert_ne!(image.get(1, 1), Color::BLUE);
    }
}
