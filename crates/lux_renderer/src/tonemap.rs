//! Tone mapping from linear radiance to displayable values.

use lux_core::{ToneMapperKind, ToneMapperSettings};
use lux_math::Color;

/// Keeps the log-average luminance finite for black pixels.
const LUMINANCE_DELTA: f32 = 1.0e-4;

/// Tone map `pixels` in place.
///
/// `Passthrough` leaves the values untouched. `Linear` scales by the
/// exposure, `Reinhard` additionally compresses highlights around the
/// log-average luminance of the image. Both clamp and optionally apply
/// gamma.
pub fn tone_map(settings: &ToneMapperSettings, pixels: &mut [Color]) {
    let exposure = 2.0f32.powf(settings.exposure);

    match settings.kind {
        ToneMapperKind::Passthrough => return,
        ToneMapperKind::Linear => {
            for pixel in pixels.iter_mut() {
                *pixel *= exposure;
            }
        }
        ToneMapperKind::Reinhard => {
            let average = log_average_luminance(pixels);
            let scale = settings.key / average.max(LUMINANCE_DELTA);

            for pixel in pixels.iter_mut() {
                let luminance = pixel.luminance() * exposure;
                if luminance <= 0.0 {
                    continue;
                }
                let scaled = luminance * scale;
                let mapped = scaled / (1.0 + scaled);
                *pixel *= exposure * mapped / luminance;
            }
        }
    }

    for pixel in pixels.iter_mut() {
        let alpha = pixel.a;
        *pixel = pixel.clamped();
        if settings.apply_gamma && settings.gamma > 0.0 {
            *pixel = pixel.pow(1.0 / settings.gamma);
        }
        pixel.a = alpha.clamp(0.0, 1.0);
    }
}

fn log_average_luminance(pixels: &[Color]) -> f32 {
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: f32 = pixels
        .iter()
        .map(|p| (LUMINANCE_DELTA + p.luminance().max(0.0)).ln())
        .sum();
    (sum / pixels.len() as f32).exp()
}
