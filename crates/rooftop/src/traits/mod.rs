use image::{GrayImage, RgbImage};
use crate::{error::SegmentationResult, types::RasterImage};

/// Preprocessed tile shared by every cue detector
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub rgb: RgbImage,
    pub gray: GrayImage,
}

impl PreparedImage {
    pub fn new(rgb: RgbImage) -> Self {
        let gray = image::imageops::grayscale(&rgb);
        Self { rgb, gray }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}

/// Trait for raster normalisation ahead of segmentation
pub trait ImagePreprocessor: Send + Sync {
    /// Turn a raw 3/4-channel tile into an enhanced RGB image of the same size
    fn preprocess(&self, image: &RasterImage) -> SegmentationResult<RgbImage>;
}

/// Trait for independent rooftop classifiers
pub trait CueDetector: Send + Sync {
    /// Short name used in logs and failure reports
    fn name(&self) -> &'static str;

    /// Produce a 0/255 mask with the prepared image's dimensions
    fn detect(&self, image: &PreparedImage) -> SegmentationResult<GrayImage>;
}

/// Trait for clean-up applied to the fused mask
pub trait MaskPostProcessor: Send + Sync {
    fn process(&self, mask: &GrayImage) -> GrayImage;
}
