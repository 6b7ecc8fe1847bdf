use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::{
    algorithms::contours::{
        approximate_vertex_count, contour_area, contour_perimeter, external_contours, fill_contour,
    },
    config::EdgeConfig,
    error::SegmentationResult,
    traits::{CueDetector, PreparedImage},
};

/// Fills large, roughly polygonal regions outlined by Canny edges.
///
/// Rooftops are mostly rectilinear, so closed outlines whose polygon
/// approximation has between `min_vertices` and `max_vertices` corners are
/// kept and rounder, organic outlines are dropped.
#[derive(Debug, Clone)]
pub struct EdgeCueDetector {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub min_area: f64,
    pub epsilon_ratio: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for EdgeCueDetector {
    fn default() -> Self {
        Self::from_config(&EdgeConfig::default())
    }
}

impl EdgeCueDetector {
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self {
            low_threshold: config.canny_low,
            high_threshold: config.canny_high,
            min_area: config.min_contour_area,
            epsilon_ratio: config.epsilon_ratio,
            min_vertices: config.min_vertices,
            max_vertices: config.max_vertices,
        }
    }

    pub fn mask(&self, gray: &GrayImage) -> GrayImage {
        let edges = canny_edges(gray, self.low_threshold, self.high_threshold);
        let mut mask = GrayImage::new(gray.width(), gray.height());

        for contour in external_contours(&edges) {
            if contour_area(&contour.points) <= self.min_area {
                continue;
            }
            let epsilon = self.epsilon_ratio * contour_perimeter(&contour.points);
            let vertices = approximate_vertex_count(&contour.points, epsilon);
            if (self.min_vertices..=self.max_vertices).contains(&vertices) {
                fill_contour(&mut mask, &contour.points);
            }
        }
        mask
    }
}

/// Canny edge map of `gray` without any pre-smoothing.
///
/// Gradients are 3x3 Sobel with L1 magnitude `|gx| + |gy|`. Non-maximum
/// suppression compares each pixel with its two neighbours along the gradient
/// direction, quantised to 0°, 45°, 90° or 135°. Survivors above `high` seed
/// edges that grow through 8-connected survivors above `low`. The one-pixel
/// image border is never an edge.
pub fn canny_edges(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    const WEAK: u8 = 1;
    const STRONG: u8 = 2;
    // tan(22.5°)
    const TAN_22_5: f32 = 0.414_213_57;

    let (width, height) = gray.dimensions();
    let mut edges = GrayImage::new(width, height);
    if width < 3 || height < 3 {
        return edges;
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let w = width as usize;
    let h = height as usize;
    let magnitude: Vec<f32> = gx
        .iter()
        .zip(gy.iter())
        .map(|(dx, dy)| f32::from(*dx).abs() + f32::from(*dy).abs())
        .collect();
    let mag = |x: usize, y: usize| magnitude[y * w + x];

    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let m = mag(x, y);
            if m <= low {
                continue;
            }
            let dx = f32::from(gx.as_raw()[y * w + x]);
            let dy = f32::from(gy.as_raw()[y * w + x]);
            let (ax, ay) = (dx.abs(), dy.abs());

            let is_peak = if ay <= ax * TAN_22_5 {
                m > mag(x - 1, y) && m >= mag(x + 1, y)
            } else if ay * TAN_22_5 >= ax {
                m > mag(x, y - 1) && m >= mag(x, y + 1)
            } else if (dx < 0.0) != (dy < 0.0) {
                m > mag(x + 1, y - 1) && m > mag(x - 1, y + 1)
            } else {
                m > mag(x - 1, y - 1) && m > mag(x + 1, y + 1)
            };
            if !is_peak {
                continue;
            }

            if m > high {
                class[y * w + x] = STRONG;
                stack.push((x, y));
            } else {
                class[y * w + x] = WEAK;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let idx = ny * w + nx;
                if class[idx] == WEAK {
                    class[idx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    for (pixel, &c) in edges.pixels_mut().zip(class.iter()) {
        if c == STRONG {
            pixel[0] = 255;
        }
    }
    edges
}

impl CueDetector for EdgeCueDetector {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn detect(&self, image: &PreparedImage) -> SegmentationResult<GrayImage> {
        Ok(self.mask(&image.gray))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rectangle_on_dark(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        let mut image = GrayImage::from_pixel(width, height, Luma([30]));
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, Luma([220]));
            }
        }
        image
    }

    #[test]
    fn test_large_rectangle_is_filled() {
        let gray = rectangle_on_dark(120, 120, 30, 30, 60, 50);
        let mask = EdgeCueDetector::default().mask(&gray);

        assert_eq!(mask.dimensions(), (120, 120));
        assert_eq!(mask.get_pixel(60, 55)[0], 255, "rectangle interior should be filled");
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn test_moderate_step_is_filled() {
        // A 60-level step is a typical roof/ground contrast after preprocessing.
        let mut gray = GrayImage::from_pixel(128, 128, Luma([100]));
        for y in 28..100 {
            for x in 24..104 {
                gray.put_pixel(x, y, Luma([160]));
            }
        }
        let mask = EdgeCueDetector::default().mask(&gray);

        assert_eq!(mask.get_pixel(64, 64)[0], 255);
        assert_eq!(mask.get_pixel(30, 34)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        let filled = mask.pixels().filter(|p| p[0] != 0).count();
        assert!(filled >= 80 * 72 - 400, "only {filled} pixels filled");
    }

    #[test]
    fn test_canny_edges_are_thin_and_closed_around_step() {
        let mut gray = GrayImage::from_pixel(64, 64, Luma([100]));
        for y in 16..48 {
            for x in 16..48 {
                gray.put_pixel(x, y, Luma([160]));
            }
        }
        let edges = canny_edges(&gray, 50.0, 150.0);

        // Left and top edges sit just outside the step, right and bottom just inside.
        assert_eq!(edges.get_pixel(15, 32)[0], 255);
        assert_eq!(edges.get_pixel(16, 32)[0], 0);
        assert_eq!(edges.get_pixel(47, 32)[0], 255);
        assert_eq!(edges.get_pixel(48, 32)[0], 0);
        assert_eq!(edges.get_pixel(32, 15)[0], 255);
        assert_eq!(edges.get_pixel(32, 47)[0], 255);
        assert_eq!(edges.get_pixel(32, 32)[0], 0);
    }

    #[test]
    fn test_canny_thresholds_gate_faint_steps() {
        // A 10-level step peaks at |gx| = 40, below the low threshold.
        let mut gray = GrayImage::from_pixel(32, 32, Luma([100]));
        for y in 0..32 {
            for x in 16..32 {
                gray.put_pixel(x, y, Luma([110]));
            }
        }
        assert!(canny_edges(&gray, 50.0, 150.0).pixels().all(|p| p[0] == 0));
        assert_eq!(canny_edges(&gray, 10.0, 30.0).get_pixel(15, 10)[0], 255);
    }

    #[test]
    fn test_small_rectangle_is_ignored() {
        let gray = rectangle_on_dark(120, 120, 50, 50, 20, 20);
        let mask = EdgeCueDetector::default().mask(&gray);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let gray = GrayImage::from_pixel(64, 64, Luma([128]));
        let mask = EdgeCueDetector::default().mask(&gray);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
