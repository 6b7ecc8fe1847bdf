//! # Rooftop Area Estimation Library
//!
//! Estimates the ground area of the rooftop in a single Web Mercator aerial
//! tile. Colour, texture and edge cues are fused into one binary mask, cleaned
//! up morphologically and converted to square metres for the tile's zoom level
//! and latitude.
//!
//! ## Core Features
//!
//! - **Trait-based stages**: swap the preprocessor, cue detectors or mask post-processor
//! - **Two-branch segmentation**: a degraded Otsu fallback takes over when the fused branch cannot run
//! - **Geodesy**: ground resolution, coverage ratio and confidence per estimate
//! - **GeoJSON Support**: export the detected roof outline in pixel coordinates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rooftop::{RasterImage, RoofAreaEstimator};
//!
//! let estimator = RoofAreaEstimator::default();
//! let tile = RasterImage::open("tile.png")?;
//! let estimate = estimator.estimate(&tile, 19, 18.5362)?;
//! println!("{:.1} m² ({})", estimate.area_m2, estimate.confidence);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Estimator
//!
//! ```rust,no_run
//! use rooftop::{ColorCueDetector, EdgeCueDetector, MaskPostprocessor, RoofAreaEstimator};
//!
//! let estimator = RoofAreaEstimator::builder()
//!     .add_cue(ColorCueDetector::default())
//!     .add_cue(EdgeCueDetector::default())
//!     .set_postprocessor(MaskPostprocessor::new(3, 7))
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod geodesy;
pub mod io;
pub mod pipeline;
pub mod traits;
pub mod types;

pub use algorithms::*;
pub use config::EstimatorConfig;
pub use error::{Result, RoofError, SegmentationFailure};
pub use geodesy::{AreaGeodesyConverter, TileCoord, TileRequest, meters_per_pixel};
pub use io::EstimateReport;
pub use pipeline::{RoofAreaEstimator, SegmentationBranch, builder::EstimatorBuilder};
pub use traits::*;
pub use types::{AreaEstimate, BinaryMask, Confidence, DetectionMethod, DetectionResult, RasterImage};
