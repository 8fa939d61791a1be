//! Sideways slab correction
//!
//! A landscape crop is turned portrait. The label edge decides the
//! direction: the strip with the stronger label color ends up on top.

use opencv::{
    core::{self, Mat, Rect, ROTATE_90_CLOCKWISE, ROTATE_90_COUNTERCLOCKWISE},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::config::OrientationConfig;
use crate::detection::ops;
use crate::error::{CropError, Result};

/// Quarter turn applied to a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    None,
    Clockwise,
    CounterClockwise,
}

/// Label color evidence at the two short edges of a landscape crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelScores {
    pub left: f64,
    pub right: f64,
}

pub struct OrientationCorrector<'a> {
    config: &'a OrientationConfig,
}

impl<'a> OrientationCorrector<'a> {
    pub fn new(config: &'a OrientationConfig) -> Self {
        Self { config }
    }

    /// `max(red, navy_weight * navy)` for the left and right edge strips
    pub fn label_scores(&self, crop: &Mat) -> Result<LabelScores> {
        let (width, height) = (crop.cols(), crop.rows());
        let strip = ((width as f64 * self.config.strip_fraction) as i32).clamp(1, width.max(1));

        let left = self.strip_score(crop, Rect::new(0, 0, strip, height))?;
        let right = self.strip_score(crop, Rect::new(width - strip, 0, strip, height))?;
        Ok(LabelScores { left, right })
    }

    fn strip_score(&self, crop: &Mat, rect: Rect) -> Result<f64> {
        let hsv = ops::hsv(&ops::roi(crop, rect)?)?;
        let red = ops::count_in_range(&hsv, &self.config.red_low)?
            + ops::count_in_range(&hsv, &self.config.red_high)?;
        let navy = ops::count_in_range(&hsv, &self.config.navy)?;
        Ok((red as f64).max(self.config.navy_weight * navy as f64))
    }

    /// Rotation that brings the crop upright
    pub fn decide(&self, crop: &Mat) -> Result<Rotation> {
        if crop.cols() <= crop.rows() {
            return Ok(Rotation::None);
        }

        let scores = self.label_scores(crop)?;
        let rotation = if scores.right > scores.left {
            Rotation::CounterClockwise
        } else {
            Rotation::Clockwise
        };
        tracing::debug!(left = scores.left, right = scores.right, ?rotation, "Sideways crop");
        Ok(rotation)
    }

    /// Rotate landscape crops to portrait; portrait crops are returned as-is
    pub fn normalize_orientation(&self, crop: Mat) -> Result<Mat> {
        let code = match self.decide(&crop)? {
            Rotation::None => return Ok(crop),
            Rotation::Clockwise => ROTATE_90_CLOCKWISE,
            Rotation::CounterClockwise => ROTATE_90_COUNTERCLOCKWISE,
        };

        let mut rotated = Mat::default();
        core::rotate(&crop, &mut rotated, code).map_err(|e| CropError::opencv("Rotation", e))?;
        Ok(rotated)
    }
}
