//! Reconstruction filters for multi-sampled pixels.

use lux_core::FilterKind;
use lux_math::Vec2;

/// Falloff of the Gaussian filter.
const GAUSSIAN_ALPHA: f32 = 2.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    pub kind: FilterKind,
}

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Self { kind }
    }

    /// Weight of a sample at `offset` from the pixel center, in pixels.
    /// The filter footprint is one pixel in each direction.
    pub fn weight(&self, offset: Vec2) -> f32 {
        let x = offset.x.abs();
        let y = offset.y.abs();

        match self.kind {
            FilterKind::Box => 1.0,
            FilterKind::Tent => (1.0 - x).max(0.0) * (1.0 - y).max(0.0),
            FilterKind::Gaussian => {
                let edge = (-GAUSSIAN_ALPHA).exp();
                let gx = ((-GAUSSIAN_ALPHA * x * x).exp() - edge).max(0.0);
                let gy = ((-GAUSSIAN_ALPHA * y * y).exp() - edge).max(0.0);
                gx * gy
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_box_is_flat() {
        let filter = Filter::new(FilterKind::Box);
        assert_eq!(filter.weight(Vec2::ZERO), filter.weight(Vec2::splat(0.5)));
    }

    #[test]
    fn test_weights_fall_off() {
        for kind in [FilterKind::Tent, FilterKind::Gaussian] {
            let filter = Filter::new(kind);
            let center = filter.weight(Vec2::ZERO);
            let half = filter.weight(Vec2::new(0.5, 0.0));
            assert!(center > half, "{kind:?}");
            assert!(half > 0.0, "{kind:?}");
            assert_abs_diff_eq!(filter.weight(Vec2::new(1.0, 0.0)), 0.0, epsilon = 1e-6);
        }
    }
}
