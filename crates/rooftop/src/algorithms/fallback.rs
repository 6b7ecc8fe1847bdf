use imageproc::contrast::{otsu_level, threshold};
use tracing::debug;

use crate::{
    algorithms::contours::{contour_area, external_contours},
    error::{Result, RoofError},
    types::{BinaryMask, DetectionMethod, DetectionResult, RasterImage},
};

/// Degraded single-threshold detector.
///
/// Binarises intensity with Otsu and reports the area of the largest external
/// contour, or the raw foreground tally when there is no contour at all. The
/// contour area is a coarser measure than a pixel tally.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSegmenter;

impl FallbackSegmenter {
    pub fn segment(&self, image: &RasterImage) -> Result<DetectionResult> {
        if image.is_empty() {
            return Err(RoofError::FallbackExhausted(format!(
                "cannot threshold a {}x{} raster",
                image.width(),
                image.height()
            )));
        }

        let gray = image.to_luma();
        let level = otsu_level(&gray);
        let binary = threshold(&gray, level);
        let mask = BinaryMask::from_gray(binary);

        let largest = external_contours(mask.as_image())
            .iter()
            .map(|c| contour_area(&c.points))
            .fold(None, |best: Option<f64>, area| Some(best.map_or(area, |b| b.max(area))));

        let pixel_count = match largest {
            Some(area) => (area.round() as u64).min(image.pixel_total()),
            None => mask.foreground_count(),
        };
        debug!(level, pixel_count, "fallback segmentation");

        Ok(DetectionResult {
            pixel_count,
            mask,
            method: DetectionMethod::Fallback,
        })
    }
}
