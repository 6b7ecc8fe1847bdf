use std::path::Path;

use crate::{
    error::Result,
    types::{BinaryMask, RasterImage},
};

impl RasterImage {
    /// Decode a PNG, JPEG or TIFF tile from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path)?;
        Ok(Self::from_dynamic(image))
    }

    /// Decode an in-memory tile, guessing the format from its header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(image))
    }
}

impl BinaryMask {
    /// Write the mask as an 8-bit grayscale PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.as_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_from_bytes_decodes_png() {
        let rgb = RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let raster = RasterImage::from_bytes(&bytes).unwrap();
        assert_eq!((raster.width(), raster.height()), (6, 4));
        assert_eq!(raster.to_rgb().get_pixel(5, 3), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(RasterImage::from_bytes(b"not an image").is_err());
    }

    #[test]
    fn test_mask_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");

        let mut gray = GrayImage::new(5, 5);
        gray.put_pixel(2, 2, Luma([255]));
        let mask = BinaryMask::from_gray(gray);
        mask.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (5, 5));
        assert_eq!(loaded.get_pixel(2, 2)[0], BinaryMask::FOREGROUND);
        assert_eq!(loaded.get_pixel(0, 0)[0], BinaryMask::BACKGROUND);
    }
}
