pub mod builder;

use tracing::{debug, warn};

use crate::{
    algorithms::{CueFuser, CueMask, FallbackSegmenter},
    error::{Result, SegmentationFailure, SegmentationResult},
    geodesy::AreaGeodesyConverter,
    traits::{CueDetector, ImagePreprocessor, MaskPostProcessor, PreparedImage},
    types::{AreaEstimate, BinaryMask, DetectionMethod, DetectionResult, RasterImage},
};

/// Which branch of the segmentation produced (or is producing) the mask.
///
/// Both branches converge on geodesy conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationBranch {
    Primary,
    Fallback(SegmentationFailure),
}

/// Roof area estimation from a single aerial tile.
///
/// Holds configuration only, so one estimator can serve concurrent calls on
/// different tiles.
pub struct RoofAreaEstimator {
    preprocessor: Box<dyn ImagePreprocessor>,
    cues: Vec<Box<dyn CueDetector>>,
    fuser: CueFuser,
    postprocessor: Box<dyn MaskPostProcessor>,
    fallback: FallbackSegmenter,
    converter: AreaGeodesyConverter,
    min_side: u32,
}

impl RoofAreaEstimator {
    /// Create a new estimator builder
    pub fn builder() -> builder::EstimatorBuilder {
        builder::EstimatorBuilder::new()
    }

    pub fn new(
        preprocessor: Box<dyn ImagePreprocessor>,
        cues: Vec<Box<dyn CueDetector>>,
        postprocessor: Box<dyn MaskPostProcessor>,
        converter: AreaGeodesyConverter,
        min_side: u32,
    ) -> Self {
        Self {
            preprocessor,
            cues,
            fuser: CueFuser,
            postprocessor,
            fallback: FallbackSegmenter,
            converter,
            min_side,
        }
    }

    /// Estimate the rooftop area of `image`, taken at `zoom` around `latitude`
    pub fn estimate(&self, image: &RasterImage, zoom: u8, latitude: f64) -> Result<AreaEstimate> {
        self.estimate_detailed(image, zoom, latitude)
            .map(|(estimate, _)| estimate)
    }

    /// Like [`estimate`](Self::estimate), also returning the detection behind it
    pub fn estimate_detailed(
        &self,
        image: &RasterImage,
        zoom: u8,
        latitude: f64,
    ) -> Result<(AreaEstimate, DetectionResult)> {
        self.converter.validate(zoom, latitude)?;
        let detection = self.detect(image)?;
        let estimate = self.converter.convert(&detection, zoom, latitude)?;
        debug!(
            area_m2 = estimate.area_m2,
            coverage = estimate.coverage_ratio,
            confidence = %estimate.confidence,
            method = %estimate.method,
            "roof area estimated"
        );
        Ok((estimate, detection))
    }

    /// Segment the roof, switching to the fallback branch on any primary failure
    pub fn detect(&self, image: &RasterImage) -> Result<DetectionResult> {
        let mut branch = SegmentationBranch::Primary;
        loop {
            branch = match branch {
                SegmentationBranch::Primary => match self.segment_primary(image) {
                    Ok(detection) => return Ok(detection),
                    Err(failure) => SegmentationBranch::Fallback(failure),
                },
                SegmentationBranch::Fallback(failure) => {
                    warn!(%failure, "primary segmentation failed, using fallback");
                    return self.fallback.segment(image);
                }
            };
        }
    }

    fn segment_primary(&self, image: &RasterImage) -> SegmentationResult<DetectionResult> {
        let (width, height) = (image.width(), image.height());
        if image.is_empty() {
            return Err(SegmentationFailure::EmptyRaster);
        }
        if width.min(height) < self.min_side {
            return Err(SegmentationFailure::TileTooSmall {
                width,
                height,
                min: self.min_side,
            });
        }

        let prepared = PreparedImage::new(self.preprocessor.preprocess(image)?);
        if prepared.dimensions() != (width, height) {
            return Err(SegmentationFailure::CueDimensionMismatch {
                cue: "preprocess",
                expected: (width, height),
                actual: prepared.dimensions(),
            });
        }

        let mut masks = Vec::with_capacity(self.cues.len());
        for cue in &self.cues {
            let mask = cue.detect(&prepared)?;
            debug!(cue = cue.name(), hits = count_foreground(&mask), "cue mask");
            masks.push(CueMask {
                cue: cue.name(),
                mask,
            });
        }

        let fused = self.fuser.fuse(width, height, &masks)?;
        let mask = BinaryMask::from_gray(self.postprocessor.process(&fused));
        if mask.dimensions() != (width, height) {
            return Err(SegmentationFailure::CueDimensionMismatch {
                cue: "postprocess",
                expected: (width, height),
                actual: mask.dimensions(),
            });
        }

        let pixel_count = mask.foreground_count();
        debug!(pixel_count, "fused segmentation");
        Ok(DetectionResult {
            pixel_count,
            mask,
            method: DetectionMethod::Fused,
        })
    }

    /// Describe the configured stages
    pub fn info(&self) -> String {
        let cues: Vec<&str> = self.cues.iter().map(|c| c.name()).collect();
        format!(
            "RoofAreaEstimator: cues [{}], zoom {}..={}, min tile side {}px",
            cues.join(", "),
            self.converter.min_zoom,
            self.converter.max_zoom,
            self.min_side
        )
    }
}

impl Default for RoofAreaEstimator {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn count_foreground(mask: &image::GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}
