use image::GrayImage;

use crate::error::{SegmentationFailure, SegmentationResult};

/// Mask produced by one named cue
#[derive(Debug, Clone)]
pub struct CueMask {
    pub cue: &'static str,
    pub mask: GrayImage,
}

/// Unions cue masks: a pixel is roof-like as soon as one cue agrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct CueFuser;

impl CueFuser {
    pub fn fuse(&self, width: u32, height: u32, cues: &[CueMask]) -> SegmentationResult<GrayImage> {
        let mut fused = GrayImage::new(width, height);
        for cue in cues {
            if cue.mask.dimensions() != (width, height) {
                return Err(SegmentationFailure::CueDimensionMismatch {
                    cue: cue.cue,
                    expected: (width, height),
                    actual: cue.mask.dimensions(),
                });
            }
            for (out, &v) in fused.iter_mut().zip(cue.mask.as_raw()) {
                *out |= v;
            }
        }
        Ok(fused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_single_cue_hit_is_enough() {
        let mut a = GrayImage::new(4, 4);
        let mut b = GrayImage::new(4, 4);
        a.put_pixel(0, 0, Luma([255]));
        b.put_pixel(3, 3, Luma([255]));

        let fused = CueFuser
            .fuse(4, 4, &[CueMask { cue: "a", mask: a }, CueMask { cue: "b", mask: b }])
            .unwrap();
        assert_eq!(fused.get_pixel(0, 0)[0], 255);
        assert_eq!(fused.get_pixel(3, 3)[0], 255);
        assert_eq!(fused.pixels().filter(|p| p[0] == 255).count(), 2);
    }

    #[test]
    fn test_mismatched_cue_is_a_failure() {
        let err = CueFuser
            .fuse(4, 4, &[CueMask { cue: "edge", mask: GrayImage::new(3, 4) }])
            .unwrap_err();
        assert_eq!(
            err,
            SegmentationFailure::CueDimensionMismatch {
                cue: "edge",
                expected: (4, 4),
                actual: (3, 4),
            }
        );
    }
}
