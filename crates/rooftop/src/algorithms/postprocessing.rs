use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::{
    algorithms::morphology::StructuringElement, config::PostprocessConfig,
    traits::MaskPostProcessor,
};

/// Elliptical opening, elliptical closing, then keep the single largest
/// 8-connected blob.
#[derive(Debug, Clone)]
pub struct MaskPostprocessor {
    /// Removes isolated specks
    pub open_element: StructuringElement,
    /// Bridges gaps between roof facets
    pub close_element: StructuringElement,
}

impl Default for MaskPostprocessor {
    fn default() -> Self {
        Self::from_config(&PostprocessConfig::default())
    }
}

impl MaskPostprocessor {
    /// Square-boxed ellipses of the given sides
    pub fn new(open_kernel: u32, close_kernel: u32) -> Self {
        Self {
            open_element: StructuringElement::ellipse(open_kernel, open_kernel),
            close_element: StructuringElement::ellipse(close_kernel, close_kernel),
        }
    }

    pub fn from_config(config: &PostprocessConfig) -> Self {
        Self::new(config.open_kernel, config.close_kernel)
    }
}

impl MaskPostProcessor for MaskPostprocessor {
    fn process(&self, mask: &GrayImage) -> GrayImage {
        let opened = self.open_element.open(mask);
        let closed = self.close_element.close(&opened);
        largest_component(&closed)
    }
}

/// Zero every foreground pixel outside the largest 8-connected component.
///
/// Ties go to the component met first in raster order. An empty mask is
/// returned unchanged.
pub fn largest_component(mask: &GrayImage) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut areas: Vec<u64> = Vec::new();
    for label in labels.pixels().map(|p| p[0] as usize) {
        if label == 0 {
            continue;
        }
        if areas.len() < label {
            areas.resize(label, 0);
        }
        areas[label - 1] += 1;
    }

    let mut out = GrayImage::new(mask.width(), mask.height());
    let Some(largest) = areas
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u64)>, (i, &area)| match best {
            Some((_, best_area)) if best_area >= area => best,
            _ => Some((i, area)),
        })
        .map(|(i, _)| (i + 1) as u32)
    else {
        return out;
    };

    for (o, l) in out.pixels_mut().zip(labels.pixels()) {
        if l[0] == largest {
            *o = Luma([255]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    fn count(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] == 255).count()
    }

    #[test]
    fn test_largest_component_keeps_only_bigger_blob() {
        let mut mask = GrayImage::new(120, 100);
        fill(&mut mask, 5, 5, 20, 25); // 500 px
        fill(&mut mask, 50, 30, 40, 50); // 2000 px

        let out = largest_component(&mask);
        assert_eq!(count(&out), 2000);
        assert_eq!(out.get_pixel(10, 10)[0], 0);
        assert_eq!(out.get_pixel(60, 40)[0], 255);
    }

    #[test]
    fn test_diagonal_touch_counts_as_connected() {
        let mut mask = GrayImage::new(10, 10);
        fill(&mut mask, 0, 0, 3, 3);
        fill(&mut mask, 3, 3, 3, 3);
        fill(&mut mask, 8, 8, 2, 2);

        assert_eq!(count(&largest_component(&mask)), 18);
    }

    #[test]
    fn test_empty_mask_stays_empty() {
        let mask = GrayImage::new(32, 32);
        assert_eq!(count(&MaskPostprocessor::default().process(&mask)), 0);
    }

    #[test]
    fn test_postprocess_drops_smaller_blob_and_specks() {
        let mut mask = GrayImage::new(160, 120);
        fill(&mut mask, 10, 10, 20, 25); // 500 px
        fill(&mut mask, 80, 40, 40, 50); // 2000 px
        mask.put_pixel(60, 100, Luma([255])); // isolated noise

        let out = MaskPostprocessor::default().process(&mask);
        assert_eq!(out.dimensions(), (160, 120));
        assert_eq!(out.get_pixel(20, 20)[0], 0);
        assert_eq!(out.get_pixel(60, 100)[0], 0);
        assert_eq!(out.get_pixel(100, 65)[0], 255);
        assert!(count(&out) <= 2000);
    }

    #[test]
    fn test_default_elements_are_five_and_ten_wide_ellipses() {
        let post = MaskPostprocessor::default();
        assert_eq!(post.open_element, StructuringElement::ellipse(5, 5));
        assert_eq!(post.close_element.dimensions(), (10, 10));
        // Corners of the opening box are not part of the ellipse.
        assert!(!post.open_element.contains(0, 0));
        assert!(post.open_element.contains(0, 2));
    }

    #[test]
    fn test_opening_removes_strands_thinner_than_ellipse() {
        let mut mask = GrayImage::new(80, 40);
        fill(&mut mask, 5, 5, 30, 30);
        fill(&mut mask, 45, 5, 30, 30);
        // Two-pixel-high bridge between the squares.
        fill(&mut mask, 35, 19, 10, 2);

        let opened = MaskPostprocessor::default().open_element.open(&mask);
        assert_eq!(opened.get_pixel(40, 19)[0], 0);
        assert_eq!(opened.get_pixel(20, 20)[0], 255);
    }
}
