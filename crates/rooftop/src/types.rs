use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Result, RoofError};

/// Raw aerial tile as handed over by the acquisition layer.
///
/// Row-major, 8 bits per sample, 3 (RGB) or 4 (RGBA) channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap a raw sample buffer, checking channel count and buffer length
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(RoofError::InvalidRaster(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(RoofError::InvalidRaster(format!(
                "buffer holds {} samples, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 4,
            data: image.into_raw(),
        }
    }

    /// Keep the alpha channel only when the decoded image carries one
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            Self::from_rgba(image.to_rgba8())
        } else {
            Self::from_rgb(image.to_rgb8())
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Total number of pixels (not samples)
    pub fn pixel_total(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_total() == 0
    }

    /// Three-channel copy; alpha is dropped, not composited
    pub fn to_rgb(&self) -> RgbImage {
        let data = match self.channels {
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            _ => self.data.clone(),
        };
        // Length is guaranteed by the constructor invariant.
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Single-channel intensity, ignoring alpha
    pub fn to_luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.to_rgb())
    }
}

/// Foreground/background mask with samples restricted to 0 and 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    pub const FOREGROUND: u8 = 255;
    pub const BACKGROUND: u8 = 0;

    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Normalise any grayscale image: every non-zero sample becomes foreground
    pub fn from_gray(mut image: GrayImage) -> Self {
        for Luma([v]) in image.pixels_mut() {
            if *v != Self::BACKGROUND {
                *v = Self::FOREGROUND;
            }
        }
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] == Self::FOREGROUND
    }

    pub fn foreground_count(&self) -> u64 {
        self.0
            .as_raw()
            .iter()
            .filter(|&&v| v == Self::FOREGROUND)
            .count() as u64
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Which segmentation branch produced a detection
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionMethod {
    /// Colour, texture and edge cues fused and cleaned up
    Fused,
    /// Single Otsu threshold, largest contour area
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Roof pixels, never more than the tile's pixel total
    pub pixel_count: u64,
    pub mask: BinaryMask,
    pub method: DetectionMethod,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Strictly-greater thresholds: exactly 0.3 is `Medium`, exactly 0.1 is `Low`
    pub fn from_coverage(coverage_ratio: f64) -> Self {
        if coverage_ratio > 0.3 {
            Self::High
        } else if coverage_ratio > 0.1 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Final, caller-visible estimate for one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AreaEstimate {
    pub area_m2: f64,
    pub coverage_ratio: f64,
    pub confidence: Confidence,
    pub method: DetectionMethod,
}
