use image::{GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold};

use crate::{
    config::TextureConfig,
    error::SegmentationResult,
    traits::{CueDetector, PreparedImage},
};

/// Low local-binary-pattern response is taken as roof material.
///
/// Computes the rotation-invariant uniform LBP code per pixel, averages it
/// over a square window, binarises the result with Otsu and inverts it.
#[derive(Debug, Clone)]
pub struct TextureCueDetector {
    pub radius: u32,
    pub points: u32,
    pub window: u32,
}

impl Default for TextureCueDetector {
    fn default() -> Self {
        Self::from_config(&TextureConfig::default())
    }
}

impl TextureCueDetector {
    pub fn from_config(config: &TextureConfig) -> Self {
        Self {
            radius: config.radius,
            points: config.radius.saturating_mul(config.points_per_radius),
            window: config.window,
        }
    }

    pub fn mask(&self, gray: &GrayImage) -> GrayImage {
        let codes = uniform_lbp(gray, self.radius as f32, self.points as usize);
        let half = self.window / 2;
        let response = imageproc::filter::box_filter(&codes, half, half);
        let level = otsu_level(&response);
        let mut mask = threshold(&response, level);
        image::imageops::invert(&mut mask);
        mask
    }
}

impl CueDetector for TextureCueDetector {
    fn name(&self) -> &'static str {
        "texture"
    }

    fn detect(&self, image: &PreparedImage) -> SegmentationResult<GrayImage> {
        Ok(self.mask(&image.gray))
    }
}

/// Rotation-invariant uniform LBP codes.
///
/// Neighbours are sampled on a circle with bilinear interpolation, reading 0
/// outside the image. A pattern with at most two 0/1 transitions (counted
/// along the sampling order, not wrapping around) maps to the number of set
/// bits, any other pattern to `points + 1`.
pub fn uniform_lbp(gray: &GrayImage, radius: f32, points: usize) -> GrayImage {
    let (width, height) = gray.dimensions();
    let offsets: Vec<(f32, f32)> = (0..points)
        .map(|p| {
            let angle = 2.0 * std::f32::consts::PI * p as f32 / points as f32;
            let dy = round5(-radius * angle.sin());
            let dx = round5(radius * angle.cos());
            (dx, dy)
        })
        .collect();

    let mut signs = vec![false; points];
    let mut codes = GrayImage::new(width, height);
    for (x, y, code) in codes.enumerate_pixels_mut() {
        let centre = f32::from(gray.get_pixel(x, y)[0]);
        for (sign, &(dx, dy)) in signs.iter_mut().zip(offsets.iter()) {
            *sign = sample_bilinear(gray, x as f32 + dx, y as f32 + dy) >= centre;
        }

        let transitions = signs.windows(2).filter(|w| w[0] != w[1]).count();
        let value = if transitions <= 2 {
            signs.iter().filter(|&&s| s).count()
        } else {
            points + 1
        };
        *code = Luma([value.min(u8::MAX as usize) as u8]);
    }
    codes
}

fn round5(v: f32) -> f32 {
    (v * 1e5).round() / 1e5
}

fn sample_bilinear(gray: &GrayImage, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let at = |xi: i64, yi: i64| -> f32 {
        if xi < 0 || yi < 0 || xi >= i64::from(gray.width()) || yi >= i64::from(gray.height()) {
            0.0
        } else {
            f32::from(gray.get_pixel(xi as u32, yi as u32)[0])
        }
    };

    // Lerp form keeps flat neighbourhoods exact.
    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let top = lerp(at(x0, y0), at(x0 + 1, y0), fx);
    let bottom = lerp(at(x0, y0 + 1), at(x0 + 1, y0 + 1), fx);
    lerp(top, bottom, fy)
}
