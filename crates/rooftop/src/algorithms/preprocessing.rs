use image::{Luma, Rgb, RgbImage};
use palette::{Clamp, FromColor, Lab, Srgb};

use crate::{
    algorithms::clahe::clahe,
    config::PreprocessConfig,
    error::{SegmentationFailure, SegmentationResult},
    traits::ImagePreprocessor,
    types::RasterImage,
};

/// Alpha removal, Gaussian smoothing and luminance-only CLAHE
#[derive(Debug, Clone)]
pub struct RasterPreprocessor {
    pub blur_kernel: u32,
    pub clip_limit: f32,
    pub tiles: u32,
}

impl Default for RasterPreprocessor {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}

impl RasterPreprocessor {
    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            clip_limit: config.clahe_clip_limit,
            tiles: config.clahe_tiles,
        }
    }
}

impl ImagePreprocessor for RasterPreprocessor {
    fn preprocess(&self, image: &RasterImage) -> SegmentationResult<RgbImage> {
        if image.is_empty() {
            return Err(SegmentationFailure::EmptyRaster);
        }
        let rgb = image.to_rgb();
        let kernel = gaussian_kernel(self.blur_kernel);
        let blurred = imageproc::filter::separable_filter_equal(&rgb, &kernel);
        Ok(equalize_luminance(&blurred, self.clip_limit, self.tiles))
    }
}

/// Normalised 1-D Gaussian taps for a `size`-wide kernel.
///
/// Sigma is derived from the size as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let centre = (size / 2) as f32;
    let taps: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / total).collect()
}

/// Equalize L* with CLAHE while leaving a*/b* untouched.
///
/// L* is quantised to 8 bits (0..=100 scaled to 0..=255) for the histogram
/// step; chroma stays in floating point.
pub fn equalize_luminance(image: &RgbImage, clip_limit: f32, tiles: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut lightness = image::GrayImage::new(width, height);
    let mut chroma = Vec::with_capacity((width * height) as usize);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let lab: Lab = Lab::from_color(Srgb::new(r, g, b).into_format::<f32>());
        let l = (lab.l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8;
        lightness.put_pixel(x, y, Luma([l]));
        chroma.push((lab.a, lab.b));
    }

    let equalized = clahe(&lightness, clip_limit, tiles);

    let mut out = RgbImage::new(width, height);
    for ((x, y, pixel), &(a, b)) in out.enumerate_pixels_mut().zip(chroma.iter()) {
        let l = f32::from(equalized.get_pixel(x, y)[0]) * 100.0 / 255.0;
        let lab: Lab = Lab::new(l, a, b);
        let rgb: Srgb = Srgb::from_color(lab);
        let rgb = rgb.clamp().into_format::<u8>();
        *pixel = Rgb([rgb.red, rgb.green, rgb.blue]);
    }
    out
}
