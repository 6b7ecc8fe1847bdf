//! Tunable constants of the estimation pipeline.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.

use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoofError};

/// Largest accepted side for the morphology structuring elements
pub const MAX_KERNEL_SIDE: u32 = 255;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EstimatorConfig {
    pub preprocess: PreprocessConfig,
    pub texture: TextureConfig,
    pub edges: EdgeConfig,
    pub postprocess: PostprocessConfig,
    pub geodesy: GeodesyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side of the square Gaussian kernel, must be odd
    pub blur_kernel: u32,
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid is `clahe_tiles x clahe_tiles`
    pub clahe_tiles: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TextureConfig {
    pub radius: u32,
    pub points_per_radius: u32,
    /// Side of the box window averaging the pattern codes, must be odd
    pub window: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            radius: 3,
            points_per_radius: 8,
            window: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EdgeConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Contours must enclose strictly more than this many pixels
    pub min_contour_area: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub epsilon_ratio: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            min_contour_area: 1000.0,
            epsilon_ratio: 0.02,
            min_vertices: 4,
            max_vertices: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PostprocessConfig {
    /// Side of the elliptical element used for opening
    pub open_kernel: u32,
    /// Side of the elliptical element used for closing
    pub close_kernel: u32,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            open_kernel: 5,
            close_kernel: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeodesyConfig {
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Absolute latitude limit in degrees
    pub max_latitude: f64,
}

impl Default for GeodesyConfig {
    fn default() -> Self {
        Self {
            min_zoom: 15,
            max_zoom: 20,
            max_latitude: crate::geodesy::WEB_MERCATOR_MAX_LATITUDE,
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EstimatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EstimatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EstimatorConfig)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if p.blur_kernel == 0 || p.blur_kernel % 2 == 0 {
            return Err(RoofError::Config(format!(
                "blur_kernel must be odd and positive, got {}",
                p.blur_kernel
            )));
        }
        if !(p.clahe_clip_limit > 0.0) {
            return Err(RoofError::Config("clahe_clip_limit must be positive".into()));
        }
        if p.clahe_tiles == 0 {
            return Err(RoofError::Config("clahe_tiles must be positive".into()));
        }

        let t = &self.texture;
        if t.radius == 0 || t.points_per_radius == 0 {
            return Err(RoofError::Config(
                "texture radius and points_per_radius must be positive".into(),
            ));
        }
        // Codes go up to points + 1 and are stored in 8 bits.
        if t.radius.checked_mul(t.points_per_radius).is_none_or(|points| points > 254) {
            return Err(RoofError::Config(
                "texture pattern has more than 254 sampling points".into(),
            ));
        }
        if t.window == 0 || t.window % 2 == 0 {
            return Err(RoofError::Config(format!(
                "texture window must be odd and positive, got {}",
                t.window
            )));
        }

        let e = &self.edges;
        if !(e.canny_low >= 0.0 && e.canny_low <= e.canny_high) {
            return Err(RoofError::Config(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                e.canny_low, e.canny_high
            )));
        }
        if !(e.epsilon_ratio > 0.0) || e.min_vertices > e.max_vertices {
            return Err(RoofError::Config(
                "edge polygon filter needs epsilon_ratio > 0 and min_vertices <= max_vertices"
                    .into(),
            ));
        }

        let m = &self.postprocess;
        for (name, side) in [("open_kernel", m.open_kernel), ("close_kernel", m.close_kernel)] {
            if !(1..=MAX_KERNEL_SIDE).contains(&side) {
                return Err(RoofError::Config(format!(
                    "postprocess {name} must lie in 1..={MAX_KERNEL_SIDE}, got {side}"
                )));
            }
        }

        let g = &self.geodesy;
        if g.min_zoom == 0 || g.min_zoom > g.max_zoom || g.max_zoom > 30 {
            return Err(RoofError::Config(format!(
                "zoom range {}..={} is not supported",
                g.min_zoom, g.max_zoom
            )));
        }
        if !(g.max_latitude > 0.0 && g.max_latitude < 90.0) {
            return Err(RoofError::Config(format!(
                "max_latitude must lie in (0, 90), got {}",
                g.max_latitude
            )));
        }
        Ok(())
    }
}
