//! Web Mercator ground resolution and slippy-map tile addressing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::GeodesyConfig,
    error::{Result, RoofError},
    types::{AreaEstimate, Confidence, DetectionResult},
};

/// Metres per pixel at the equator for zoom 0 with 256px tiles
pub const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Latitude where the Web Mercator square ends
pub const WEB_MERCATOR_MAX_LATITUDE: f64 = 85.051_128_78;

pub const DEFAULT_ZOOM: u8 = 19;

/// Ground resolution of one pixel
pub fn meters_per_pixel(zoom: u8, latitude: f64) -> f64 {
    EQUATOR_METERS_PER_PIXEL * latitude.to_radians().cos() / 2f64.powi(i32::from(zoom))
}

/// Converts pixel counts into ground area, coverage and confidence
#[derive(Debug, Clone, PartialEq)]
pub struct AreaGeodesyConverter {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub max_latitude: f64,
}

impl Default for AreaGeodesyConverter {
    fn default() -> Self {
        Self::from_config(&GeodesyConfig::default())
    }
}

impl AreaGeodesyConverter {
    pub fn from_config(config: &GeodesyConfig) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            max_latitude: config.max_latitude,
        }
    }

    /// Reject zoom levels and latitudes the formula does not cover
    pub fn validate(&self, zoom: u8, latitude: f64) -> Result<()> {
        if !(self.min_zoom..=self.max_zoom).contains(&zoom) {
            return Err(RoofError::GeodesyDomain(format!(
                "zoom {zoom} outside supported range {}..={}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !latitude.is_finite() || latitude.abs() > self.max_latitude {
            return Err(RoofError::GeodesyDomain(format!(
                "latitude {latitude} outside supported range ±{}",
                self.max_latitude
            )));
        }
        Ok(())
    }

    pub fn area_m2(&self, pixel_count: u64, zoom: u8, latitude: f64) -> Result<f64> {
        self.validate(zoom, latitude)?;
        let resolution = meters_per_pixel(zoom, latitude);
        let area_per_pixel = resolution * resolution;
        Ok(pixel_count as f64 * area_per_pixel)
    }

    pub fn coverage_ratio(&self, pixel_count: u64, width: u32, height: u32) -> Result<f64> {
        let total = u64::from(width) * u64::from(height);
        if total == 0 {
            return Err(RoofError::GeodesyDomain(format!(
                "coverage undefined for a {width}x{height} image"
            )));
        }
        Ok((pixel_count as f64 / total as f64).min(1.0))
    }

    pub fn convert(&self, detection: &DetectionResult, zoom: u8, latitude: f64) -> Result<AreaEstimate> {
        let (width, height) = detection.mask.dimensions();
        let coverage_ratio = self.coverage_ratio(detection.pixel_count, width, height)?;
        let area_m2 = self.area_m2(detection.pixel_count, zoom, latitude)?;
        Ok(AreaEstimate {
            area_m2,
            coverage_ratio,
            confidence: Confidence::from_coverage(coverage_ratio),
            method: detection.method,
        })
    }
}

/// Slippy-map tile index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    /// Tile containing the given WGS84 position.
    ///
    /// Latitude is clamped to the Web Mercator limit; indices are clamped to
    /// the `2^zoom` grid.
    pub fn from_lat_lng(latitude: f64, longitude: f64, zoom: u8) -> Self {
        let n = 2f64.powi(i32::from(zoom));
        let lat = latitude
            .clamp(-WEB_MERCATOR_MAX_LATITUDE, WEB_MERCATOR_MAX_LATITUDE)
            .to_radians();
        let x = ((longitude + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - lat.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();
        let max = n - 1.0;
        Self {
            x: x.clamp(0.0, max) as u32,
            y: y.clamp(0.0, max) as u32,
            zoom,
        }
    }
}

/// Position the serving layer asks about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TileRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

impl TileRequest {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn tile(&self) -> TileCoord {
        TileCoord::from_lat_lng(self.lat, self.lng, self.zoom)
    }
}
