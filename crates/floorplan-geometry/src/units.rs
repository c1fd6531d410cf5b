//! Meters to pixels conversion

use serde::{Deserialize, Serialize};

/// Pixels per meter used when no scale is configured
pub const DEFAULT_METERS_TO_PIXELS: f64 = 50.0;

/// Linear scale between human units (meters) and wire units (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pixels_per_meter: f64,
}

impl Scale {
    /// Create a scale, rejecting zero, negative and non-finite factors
    pub fn new(pixels_per_meter: f64) -> Option<Self> {
        if pixels_per_meter.is_finite() && pixels_per_meter > 0.0 {
            Some(Self { pixels_per_meter })
        } else {
            None
        }
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    /// Convert a length in meters to whole pixels
    pub fn to_pixels(&self, meters: f64) -> f64 {
        (meters * self.pixels_per_meter).round()
    }

    /// Convert a pixel length back to meters (for display and prompt defaults)
    pub fn to_meters(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_meter
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            pixels_per_meter: DEFAULT_METERS_TO_PIXELS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_scale_is_fifty() {
        let scale = Scale::default();
        assert_eq!(scale.to_pixels(2.0), 100.0);
        assert_eq!(scale.to_pixels(1.0), 50.0);
        assert_eq!(scale.to_meters(600.0), 12.0);
    }

    #[test]
    fn rejects_degenerate_scales() {
        assert!(Scale::new(0.0).is_none());
        assert!(Scale::new(-25.0).is_none());
        assert!(Scale::new(f64::NAN).is_none());
        assert!(Scale::new(f64::INFINITY).is_none());
        assert!(Scale::new(25.0).is_some());
    }

    #[test]
    fn fractional_meters_round_to_whole_pixels() {
        let scale = Scale::new(25.0).unwrap();
        // 1.33 * 25 = 33.25
        assert_eq!(scale.to_pixels(1.33), 33.0);
        // 0.5 * 25 = 12.5 rounds away from zero
        assert_eq!(scale.to_pixels(0.5), 13.0);
    }

    proptest! {
        #[test]
        fn to_pixels_is_within_half_a_pixel(meters in 0.01f64..500.0, ppm in 1.0f64..200.0) {
            let scale = Scale::new(ppm).unwrap();
            let px = scale.to_pixels(meters);
            prop_assert!((px - meters * ppm).abs() <= 0.5);
            prop_assert_eq!(px.fract(), 0.0);
        }
    }
}
