//! Coarse scene classification
//!
//! Two independent detectors steer the rest of the pipeline:
//!
//! - screenshot UI (status bar, corner icon, top text): screenshots arrive
//!   pre-cropped, so the final crop must not trim a margin
//! - wood desk: brown grain breaks the plain threshold strategies, so the
//!   segmenter switches to a hue-aware mask
//!
//! Neither is a learned model; both are cheap statistics on fixed regions.

use opencv::{core::Mat, core::Rect, prelude::*};
use serde::{Deserialize, Serialize};

use super::ops;
use crate::config::{CropConfig, SceneConfig};
use crate::error::Result;

/// Background type selecting the segmentation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Brown/tan wood grain covers a large part of the frame
    Wood,
    /// Mean luminance below the dark cutoff (black grading backdrop)
    Dark,
    /// Everything else: plain desk, paper, bright table
    Light,
}

/// Everything the classifiers found out about one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneAnalysis {
    pub kind: SceneKind,
    pub is_screenshot: bool,
    pub mean_luminance: f64,
}

pub struct SceneClassifier<'a> {
    config: &'a CropConfig,
}

impl<'a> SceneClassifier<'a> {
    pub fn new(config: &'a CropConfig) -> Self {
        Self { config }
    }

    /// Run both detectors and pick the segmentation strategy.
    ///
    /// Priority: wood, then dark, then light.
    pub fn analyze(&self, image: &Mat) -> Result<SceneAnalysis> {
        let gray = ops::grayscale(image)?;
        let mean_luminance = ops::mean(&gray)?;
        let is_screenshot = self.is_screenshot_gray(&gray)?;

        let kind = if self.is_wood_background(image)? {
            SceneKind::Wood
        } else if mean_luminance < self.config.segmentation.dark_mean_luminance {
            SceneKind::Dark
        } else {
            SceneKind::Light
        };

        Ok(SceneAnalysis {
            kind,
            is_screenshot,
            mean_luminance,
        })
    }

    /// Detect phone screenshot chrome in a BGR image
    pub fn is_screenshot(&self, image: &Mat) -> Result<bool> {
        let gray = ops::grayscale(image)?;
        self.is_screenshot_gray(&gray)
    }

    fn is_screenshot_gray(&self, gray: &Mat) -> Result<bool> {
        let cfg: &SceneConfig = &self.config.scene;
        let (width, height) = (gray.cols(), gray.rows());

        // Solid status bar across the top
        let bar = ops::roi(gray, Rect::new(0, 0, width, fraction(height, cfg.status_bar_height)))?;
        let (bar_mean, bar_spread) = ops::mean_std_dev(&bar)?;
        if bar_spread < cfg.status_bar_max_spread && bar_mean > cfg.status_bar_min_mean {
            tracing::debug!(bar_mean, bar_spread, "screenshot: status bar");
            return Ok(true);
        }

        // App icon / back button in the top-left corner
        let corner_rect = Rect::new(
            0,
            0,
            fraction(width, cfg.corner_width),
            fraction(height, cfg.corner_height),
        );
        let corner_edges = ops::canny(&ops::roi(gray, corner_rect)?, cfg.corner_canny)?;
        let density = ops::count_non_zero(&corner_edges)? as f64 / corner_rect.area() as f64;
        if density > cfg.corner_min_edge_density {
            tracing::debug!(density, "screenshot: corner icon");
            return Ok(true);
        }

        // Title text in the top-center strip
        let text_width = fraction(width, cfg.text_strip_width);
        let text_rect = Rect::new(
            (width - text_width) / 2,
            0,
            text_width,
            fraction(height, cfg.text_strip_height),
        );
        let (_, text_spread) = ops::mean_std_dev(&ops::roi(gray, text_rect)?)?;
        if text_spread > cfg.text_strip_min_spread {
            tracing::debug!(text_spread, "screenshot: top text");
            return Ok(true);
        }

        Ok(false)
    }

    /// Detect a wood desk from the share of brown/tan pixels
    pub fn is_wood_background(&self, image: &Mat) -> Result<bool> {
        let cfg = &self.config.scene;
        let hsv = ops::hsv(image)?;
        let wood_pixels = ops::count_in_range(&hsv, &cfg.wood_range)? as f64;
        let total = (image.rows() as f64) * (image.cols() as f64);
        Ok(total > 0.0 && wood_pixels / total > cfg.wood_min_fraction)
    }
}

/// `length * ratio`, at least one pixel
fn fraction(length: i32, ratio: f64) -> i32 {
    ((length as f64 * ratio) as i32).clamp(1, length.max(1))
}
