//! Background-adaptive foreground segmentation
//!
//! A single global threshold fails under mixed lighting, so the mask is
//! built by one of three strategies chosen from the [`SceneKind`]:
//!
//! - **Wood**: drop brown/tan hues, keep edges, plastic glare and blue tones
//! - **Dark**: bright pixels on a black backdrop, plus edges
//! - **Light**: local adaptive threshold, edges and cast shadows
//!
//! Every strategy ends with a close→open pass to join broken borders and
//! drop speckle.

use opencv::{
    core::Mat,
    imgproc::{ADAPTIVE_THRESH_GAUSSIAN_C, THRESH_BINARY, THRESH_BINARY_INV},
};

use super::ops;
use super::scene::SceneKind;
use crate::config::SegmentationConfig;
use crate::error::{CropError, Result};

pub struct Segmenter<'a> {
    config: &'a SegmentationConfig,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a SegmentationConfig) -> Self {
        Self { config }
    }

    /// Build the binary (0/255) foreground mask for a BGR image
    pub fn segment(&self, image: &Mat, scene: SceneKind) -> Result<Mat> {
        let gray = ops::grayscale(image)?;
        let blurred = ops::blur(&gray, self.config.blur_kernel_size)?;

        match scene {
            SceneKind::Wood => self.wood_mask(image, &gray, &blurred),
            SceneKind::Dark => self.dark_mask(&blurred),
            SceneKind::Light => self.light_mask(&blurred),
        }
    }

    fn wood_mask(&self, image: &Mat, gray: &Mat, blurred: &Mat) -> Result<Mat> {
        let cfg = self.config;
        let hsv = ops::hsv(image)?;

        let wood = ops::in_range(&hsv, &cfg.wood_exclusion)?;
        let non_wood = ops::bitwise_not(&wood)?;

        let edges = ops::canny(blurred, cfg.wood_canny)?;
        let bright = ops::bright_pixels(gray, cfg.bright_threshold)?;
        let blue = ops::in_range(&hsv, &cfg.blue_range)?;

        let foreground = ops::union_all(&[&edges, &bright, &blue])?;
        let masked = ops::bitwise_and(&foreground, &non_wood)?;
        ops::close_then_open(&masked, cfg.wood_morph_kernel_size, 1, 1)
    }

    fn dark_mask(&self, blurred: &Mat) -> Result<Mat> {
        let cfg = self.config;
        let bright = ops::threshold(blurred, cfg.dark_foreground_threshold, THRESH_BINARY)?;
        let edges = ops::canny(blurred, cfg.dark_canny)?;
        let combined = ops::bitwise_or(&bright, &edges)?;
        ops::close_then_open(
            &combined,
            cfg.morph_kernel_size,
            cfg.close_iterations,
            cfg.open_iterations,
        )
    }

    fn light_mask(&self, blurred: &Mat) -> Result<Mat> {
        let cfg = self.config;

        let mut adaptive = Mat::default();
        opencv::imgproc::adaptive_threshold(
            blurred,
            &mut adaptive,
            255.0,
            ADAPTIVE_THRESH_GAUSSIAN_C,
            THRESH_BINARY_INV,
            cfg.adaptive_block_size,
            cfg.adaptive_bias,
        )
        .map_err(|e| CropError::opencv("Adaptive threshold", e))?;

        let edges = ops::canny(blurred, cfg.light_canny)?;
        let shadows = ops::threshold(blurred, cfg.shadow_threshold, THRESH_BINARY_INV)?;

        let combined = ops::union_all(&[&adaptive, &edges, &shadows])?;
        ops::close_then_open(
            &combined,
            cfg.morph_kernel_size,
            cfg.close_iterations,
            cfg.open_iterations,
        )
    }
}
