//! Axis-aligned crop of the detected box

use opencv::{core::Mat, prelude::*};

use crate::config::ExtractionConfig;
use crate::detection::BoundingBox;
use crate::detection::ops;
use crate::error::{CropError, Result};

pub struct RegionExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> RegionExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Box actually cut from a `width x height` image.
    ///
    /// With `apply_margin` each side loses `margin_inset_percent` of its
    /// length. An inset that clamps to nothing falls back to the raw box.
    pub fn crop_box(
        &self,
        bbox: BoundingBox,
        width: i32,
        height: i32,
        apply_margin: bool,
    ) -> Option<BoundingBox> {
        let inset = if apply_margin {
            bbox.inset(self.config.margin_inset_percent)
        } else {
            bbox
        };
        inset
            .clamp_to(width, height)
            .or_else(|| bbox.clamp_to(width, height))
    }

    /// Owned BGR copy of the (inset) box
    ///
    /// # Errors
    ///
    /// Returns `CropError::Extraction` when the box does not overlap the
    /// image at all. Its `confidence` is 0.0; the caller fills in the
    /// detection score.
    pub fn extract(&self, image: &Mat, bbox: BoundingBox, apply_margin: bool) -> Result<Mat> {
        let (width, height) = (image.cols(), image.rows());
        let region = self
            .crop_box(bbox, width, height, apply_margin)
            .ok_or_else(|| CropError::Extraction {
                reason: format!("box {:?} lies outside the {}x{} image", bbox, width, height),
                confidence: 0.0,
            })?;

        tracing::debug!(?bbox, ?region, apply_margin, "Extracting region");
        ops::roi(image, region.to_rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ops::test_support::{fill, solid};
    use opencv::core::{Rect, Vec3b};

    #[test]
    fn test_margin_inset_applied() {
        let image = solid(1000, 1400, (0.0, 0.0, 0.0));
        let config = ExtractionConfig::default();
        let crop = RegionExtractor::new(&config)
            .extract(&image, BoundingBox::new(200, 280, 600, 840), true)
            .unwrap();
        assert_eq!((crop.cols(), crop.rows()), (576, 806));
    }

    #[test]
    fn test_screenshot_uses_raw_box() {
        let image = solid(1000, 1400, (0.0, 0.0, 0.0));
        let config = ExtractionConfig::default();
        let crop = RegionExtractor::new(&config)
            .extract(&image, BoundingBox::new(200, 280, 600, 840), false)
            .unwrap();
        assert_eq!((crop.cols(), crop.rows()), (600, 840));
    }

    #[test]
    fn test_crop_content_comes_from_box() {
        let mut image = solid(100, 100, (0.0, 0.0, 0.0));
        fill(&mut image, Rect::new(10, 20, 30, 40), (1.0, 2.0, 3.0));
        let config = ExtractionConfig::default();
        let crop = RegionExtractor::new(&config)
            .extract(&image, BoundingBox::new(10, 20, 30, 40), false)
            .unwrap();
        let px: &Vec3b = crop.at_2d(0, 0).unwrap();
        assert_eq!((px[0], px[1], px[2]), (1, 2, 3));
        let px: &Vec3b = crop.at_2d(39, 29).unwrap();
        assert_eq!((px[0], px[1], px[2]), (1, 2, 3));
    }

    #[test]
    fn test_extract_is_repeatable() {
        let mut image = solid(400, 500, (30.0, 30.0, 30.0));
        fill(&mut image, Rect::new(60, 80, 240, 336), (200.0, 180.0, 10.0));
        fill(&mut image, Rect::new(90, 120, 40, 40), (0.0, 0.0, 250.0));
        let config = ExtractionConfig::default();
        let extractor = RegionExtractor::new(&config);
        let bbox = BoundingBox::new(60, 80, 240, 336);

        let first = extractor.extract(&image, bbox, true).unwrap();
        let second = extractor.extract(&image, bbox, true).unwrap();
        assert_eq!((first.cols(), first.rows()), (second.cols(), second.rows()));
        assert_eq!(first.data_bytes().unwrap(), second.data_bytes().unwrap());
    }

    #[test]
    fn test_box_is_clamped_to_image() {
        let config = ExtractionConfig { margin_inset_percent: 0.0 };
        let extractor = RegionExtractor::new(&config);
        assert_eq!(
            extractor.crop_box(BoundingBox::new(-20, 50, 100, 100), 60, 120, true),
            Some(BoundingBox::new(0, 50, 60, 70))
        );
    }

    #[test]
    fn test_collapsed_inset_falls_back_to_raw_box() {
        let config = ExtractionConfig { margin_inset_percent: 0.45 };
        let extractor = RegionExtractor::new(&config);
        // 2px box: 45% inset rounds to 1px per side and leaves nothing
        assert_eq!(
            extractor.crop_box(BoundingBox::new(5, 5, 2, 2), 20, 20, true),
            Some(BoundingBox::new(5, 5, 2, 2))
        );
    }

    #[test]
    fn test_box_outside_image_is_extraction_error() {
        let image = solid(50, 50, (0.0, 0.0, 0.0));
        let config = ExtractionConfig::default();
        let err = RegionExtractor::new(&config)
            .extract(&image, BoundingBox::new(80, 80, 10, 10), true)
            .unwrap_err();
        assert!(matches!(err, CropError::Extraction { .. }));
    }
}
