use image::{GrayImage, Luma};

/// Binary structuring element stored as offsets from its anchor.
///
/// The anchor sits at `(width / 2, height / 2)`, so even-sized elements reach
/// one pixel further up and left than down and right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: u32,
    height: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// Ellipse inscribed in a `width x height` box.
    ///
    /// Row `i` spans `c - dx ..= c + dx` with `c = width / 2`, `r = height / 2`,
    /// `dy = i - r` and `dx = round(c * sqrt(1 - dy² / r²))`, clipped to the box.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let r = (height / 2) as i32;
        let c = (width / 2) as i32;
        let inv_r2 = if r > 0 { 1.0 / f64::from(r * r) } else { 0.0 };

        let mut offsets = Vec::new();
        for i in 0..height as i32 {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (f64::from(c) * (f64::from(r * r - dy * dy) * inv_r2).sqrt()).round() as i32;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(width as i32);
            offsets.extend((j1..j2).map(|j| (j - c, dy)));
        }
        Self {
            width,
            height,
            offsets,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether box cell `(x, y)` belongs to the element
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let key = (x as i32 - (self.width / 2) as i32, y as i32 - (self.height / 2) as i32);
        self.offsets.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Foreground where every in-bounds cell under the element is foreground.
    ///
    /// Cells outside the image are ignored, so the border does not erode.
    pub fn erode(&self, mask: &GrayImage) -> GrayImage {
        self.apply(mask, |any_background, _| !any_background)
    }

    /// Foreground where any in-bounds cell under the element is foreground
    pub fn dilate(&self, mask: &GrayImage) -> GrayImage {
        self.apply(mask, |_, any_foreground| any_foreground)
    }

    /// Erosion followed by dilation
    pub fn open(&self, mask: &GrayImage) -> GrayImage {
        self.dilate(&self.erode(mask))
    }

    /// Dilation followed by erosion
    pub fn close(&self, mask: &GrayImage) -> GrayImage {
        self.erode(&self.dilate(mask))
    }

    fn apply(&self, mask: &GrayImage, keep: impl Fn(bool, bool) -> bool) -> GrayImage {
        let (width, height) = mask.dimensions();
        let mut out = GrayImage::new(width, height);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let mut any_foreground = false;
            let mut any_background = false;
            for &(dx, dy) in &self.offsets {
                let sx = x as i64 + i64::from(dx);
                let sy = y as i64 + i64::from(dy);
                if sx < 0 || sy < 0 || sx >= i64::from(width) || sy >= i64::from(height) {
                    continue;
                }
                if mask.get_pixel(sx as u32, sy as u32)[0] != 0 {
                    any_foreground = true;
                } else {
                    any_background = true;
                }
                if any_foreground && any_background {
                    break;
                }
            }
            if keep(any_background, any_foreground) {
                *pixel = Luma([255]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint(element: &StructuringElement) -> Vec<String> {
        let (width, height) = element.dimensions();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| if element.contains(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_five_by_five_ellipse_footprint() {
        let element = StructuringElement::ellipse(5, 5);
        assert_eq!(
            footprint(&element),
            vec!["..#..", "#####", "#####", "#####", "..#.."]
        );
        assert_eq!(element.len(), 17);
    }

    #[test]
    fn test_ten_by_ten_ellipse_footprint() {
        let element = StructuringElement::ellipse(10, 10);
        assert_eq!(
            footprint(&element),
            vec![
                ".....#....",
                "..#######.",
                ".#########",
                "##########",
                "##########",
                "##########",
                "##########",
                "##########",
                ".#########",
                "..#######.",
            ]
        );
    }

    #[test]
    fn test_erode_then_dilate_restores_square() {
        let mut mask = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let element = StructuringElement::ellipse(5, 5);

        let eroded = element.erode(&mask);
        assert_eq!(eroded.get_pixel(7, 7)[0], 255);
        assert_eq!(eroded.get_pixel(6, 6)[0], 0);
        assert_eq!(eroded.get_pixel(5, 10)[0], 0);

        let opened = element.open(&mask);
        assert_eq!(opened.get_pixel(10, 10)[0], 255);
        assert_eq!(opened.get_pixel(4, 10)[0], 0);
    }

    #[test]
    fn test_open_removes_thin_line() {
        let mut mask = GrayImage::new(20, 20);
        for x in 0..20 {
            mask.put_pixel(x, 10, Luma([255]));
        }
        let opened = StructuringElement::ellipse(5, 5).open(&mask);
        assert!(opened.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_close_bridges_narrow_gap() {
        let mut mask = GrayImage::new(30, 12);
        for y in 2..10 {
            for x in 2..13 {
                mask.put_pixel(x, y, Luma([255]));
            }
            for x in 17..28 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let closed = StructuringElement::ellipse(10, 10).close(&mask);
        assert_eq!(closed.get_pixel(15, 6)[0], 255);
    }

    #[test]
    fn test_border_does_not_erode() {
        let mask = GrayImage::from_pixel(8, 8, Luma([255]));
        let eroded = StructuringElement::ellipse(5, 5).erode(&mask);
        assert!(eroded.pixels().all(|p| p[0] == 255));
    }
}
