//! Card and slab detection
//!
//! Chains the scene classifiers, the segmenter, the candidate extractor and
//! the scorer, and reports the best-scoring card outline.

use opencv::{core::Mat, prelude::*};
use serde::{Deserialize, Serialize};

use super::candidate::{BoundingBox, CandidateExtractor};
use super::scene::{SceneClassifier, SceneKind};
use super::scoring::ConfidenceScorer;
use super::segmentation::Segmenter;
use crate::config::CropConfig;
use crate::error::Result;

/// Winning candidate of one detection run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Image carries phone UI; no margin is trimmed from the crop
    pub is_screenshot: bool,
    /// Segmentation strategy that produced the winning mask
    pub scene: SceneKind,
}

pub struct CardDetector<'a> {
    config: &'a CropConfig,
}

impl<'a> CardDetector<'a> {
    pub fn new(config: &'a CropConfig) -> Self {
        Self { config }
    }

    /// Locate the most card-like object in a BGR image.
    ///
    /// Returns `Ok(None)` when no contour passes the geometric filters.
    ///
    /// # Errors
    ///
    /// Returns `CropError::OpenCv` if an image operation fails.
    pub fn detect(&self, image: &Mat) -> Result<Option<DetectionResult>> {
        let (width, height) = (image.cols(), image.rows());
        let image_area = width as f64 * height as f64;

        // Step 1: Scene classification
        let scene = SceneClassifier::new(self.config).analyze(image)?;
        tracing::info!(
            width,
            height,
            scene = ?scene.kind,
            is_screenshot = scene.is_screenshot,
            mean_luminance = scene.mean_luminance,
            "Segmenting image"
        );

        // Step 2: Foreground mask
        let mask = Segmenter::new(&self.config.segmentation).segment(image, scene.kind)?;

        // Step 3: Geometric filtering
        let mut candidates =
            CandidateExtractor::new(&self.config.candidates).extract_candidates(&mask, image_area)?;
        if candidates.is_empty() {
            tracing::warn!("No card-shaped contour found");
            return Ok(None);
        }

        // Step 4: Scoring
        let scorer = ConfidenceScorer::new(&self.config.candidates);
        let Some(best) = scorer.select_best(&mut candidates) else {
            return Ok(None);
        };
        for candidate in &candidates {
            tracing::debug!(
                index = candidate.index,
                confidence = candidate.confidence,
                "candidate scored"
            );
        }

        let winner = &candidates[best];
        tracing::info!(
            bbox = ?winner.bbox,
            confidence = winner.confidence,
            candidates = candidates.len(),
            "Card detected"
        );

        Ok(Some(DetectionResult {
            bbox: winner.bbox,
            confidence: winner.confidence,
            is_screenshot: scene.is_screenshot,
            scene: scene.kind,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ops::test_support::{fill, solid};
    use opencv::core::Rect;

    #[test]
    fn test_detects_white_card_on_black() {
        let mut image = solid(500, 700, (0.0, 0.0, 0.0));
        fill(&mut image, Rect::new(100, 140, 300, 420), (255.0, 255.0, 255.0));

        let config = CropConfig::default();
        let result = CardDetector::new(&config).detect(&image).unwrap().unwrap();

        assert_eq!(result.scene, SceneKind::Dark);
        assert!(!result.is_screenshot);
        assert!(result.confidence >= 0.85);
        assert!((result.bbox.x - 100).abs() <= 3);
        assert!((result.bbox.y - 140).abs() <= 3);
        assert!((result.bbox.width - 300).abs() <= 6);
        assert!((result.bbox.height - 420).abs() <= 6);
    }

    #[test]
    fn test_detects_dark_card_on_light_desk() {
        let mut image = solid(500, 700, (235.0, 235.0, 235.0));
        fill(&mut image, Rect::new(100, 140, 300, 420), (50.0, 50.0, 50.0));

        let config = CropConfig::default();
        let result = CardDetector::new(&config).detect(&image).unwrap().unwrap();

        assert_eq!(result.scene, SceneKind::Light);
        assert!((result.bbox.x - 100).abs() <= 3);
        assert!((result.bbox.width - 300).abs() <= 6);
    }

    #[test]
    fn test_uniform_image_has_no_card() {
        let config = CropConfig::default();
        for bgr in [(0.0, 0.0, 0.0), (255.0, 255.0, 255.0)] {
            let image = solid(300, 420, bgr);
            assert!(CardDetector::new(&config).detect(&image).unwrap().is_none());
        }
    }

    #[test]
    fn test_largest_plausible_card_wins() {
        let mut image = solid(800, 600, (0.0, 0.0, 0.0));
        // Small card, then a bigger one in the band the area score favors
        fill(&mut image, Rect::new(20, 300, 150, 210), (255.0, 255.0, 255.0));
        fill(&mut image, Rect::new(300, 60, 300, 420), (255.0, 255.0, 255.0));

        let config = CropConfig::default();
        let result = CardDetector::new(&config).detect(&image).unwrap().unwrap();
        assert!((result.bbox.x - 300).abs() <= 3);
    }
}
