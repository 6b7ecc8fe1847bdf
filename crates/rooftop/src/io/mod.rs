//! File and wire formats at the edges of the estimator.

pub mod geojson;
pub mod raster;
pub mod report;

pub use report::EstimateReport;
