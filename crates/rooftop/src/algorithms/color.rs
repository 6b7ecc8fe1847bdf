use image::{GrayImage, Luma, RgbImage};
use palette::{FromColor, Hsv, Srgb};

use crate::{
    error::SegmentationResult,
    traits::{CueDetector, PreparedImage},
};

/// 8-bit HSV sample: hue in `0..180`, saturation and value in `0..=255`
pub type HsvSample = [u8; 3];

/// Inclusive box in HSV space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: HsvSample,
    pub upper: HsvSample,
}

impl HsvRange {
    pub const fn new(lower: HsvSample, upper: HsvSample) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, sample: HsvSample) -> bool {
        (0..3).all(|i| self.lower[i] <= sample[i] && sample[i] <= self.upper[i])
    }
}

/// Typical roofing materials. Red tile needs two boxes because hue wraps at 180.
pub const ROOF_COLOR_RANGES: [HsvRange; 5] = [
    // neutral grays, whites and dark roofing
    HsvRange::new([0, 0, 50], [180, 50, 200]),
    // red / terracotta tile
    HsvRange::new([0, 100, 100], [10, 255, 255]),
    HsvRange::new([170, 100, 100], [180, 255, 255]),
    // orange / brown tile
    HsvRange::new([8, 50, 50], [25, 255, 200]),
    // bluish-gray metal
    HsvRange::new([90, 50, 50], [130, 255, 200]),
];

/// Convert an RGB pixel to 8-bit HSV with the hue halved to fit a byte
pub fn rgb_to_hsv(rgb: [u8; 3]) -> HsvSample {
    let [r, g, b] = rgb;
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());

    let hue = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % 180;
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;
    [hue as u8, saturation, value]
}

/// Marks pixels whose colour falls in any of the configured ranges
#[derive(Debug, Clone)]
pub struct ColorCueDetector {
    pub ranges: Vec<HsvRange>,
}

impl Default for ColorCueDetector {
    fn default() -> Self {
        Self {
            ranges: ROOF_COLOR_RANGES.to_vec(),
        }
    }
}

impl ColorCueDetector {
    pub fn mask(&self, image: &RgbImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut mask = GrayImage::new(width, height);
        for (x, y, pixel) in image.enumerate_pixels() {
            let hsv = rgb_to_hsv(pixel.0);
            if self.ranges.iter().any(|range| range.contains(hsv)) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }
}

impl CueDetector for ColorCueDetector {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(&self, image: &PreparedImage) -> SegmentationResult<GrayImage> {
        Ok(self.mask(&image.rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn uniform(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(20, 20, Rgb(rgb))
    }

    #[test]
    fn test_hsv_conversion_uses_half_degree_hue() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_gray_roof_is_detected() {
        let mask = ColorCueDetector::default().mask(&uniform([140, 140, 140]));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_terracotta_on_both_sides_of_hue_wrap() {
        let detector = ColorCueDetector::default();
        // hue ~4 and hue ~175
        assert!(detector.mask(&uniform([200, 60, 40])).pixels().all(|p| p[0] == 255));
        assert!(detector.mask(&uniform([200, 40, 70])).pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_vegetation_green_is_rejected() {
        let detector = ColorCueDetector::default();
        assert!(detector.mask(&uniform([0, 200, 0])).pixels().all(|p| p[0] == 0));
        assert!(detector.mask(&uniform([40, 120, 40])).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_very_dark_and_very_bright_fall_outside_neutral_band() {
        let detector = ColorCueDetector::default();
        assert!(detector.mask(&uniform([10, 10, 10])).pixels().all(|p| p[0] == 0));
        assert!(detector.mask(&uniform([250, 250, 250])).pixels().all(|p| p[0] == 0));
    }
}
