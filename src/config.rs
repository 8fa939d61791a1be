//! Configuration structures for the slab_crop pipeline.
//!
//! Every tunable threshold lives here, grouped by pipeline stage, and a
//! `&CropConfig` is handed to each stage. Nothing reads global state, so
//! differently tuned croppers can run side by side.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use slab_crop::CropConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = CropConfig::from_json_file(Path::new("crop.json"))?;
//!
//! // Or use defaults
//! let config = CropConfig::default();
//! # Ok::<(), slab_crop::CropError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`SegmentationConfig`]: mask construction for dark, light and wood scenes
//! - [`SceneConfig`]: screenshot and wood background classifiers
//! - [`CandidateConfig`]: geometric filters on contours
//! - [`ExtractionConfig`]: margin inset of the final crop
//! - [`OrientationConfig`]: slab label color signatures
//! - [`EncodingConfig`]: PNG output
//! - [`ServiceConfig`]: limits owned by the transport layer

use opencv::core::Scalar;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{card, extraction, scene, segmentation, service};
use crate::error::{CropError, Result};

/// Complete pipeline configuration.
///
/// Serializable to/from JSON so tunings can be versioned next to test images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CropConfig {
    pub segmentation: SegmentationConfig,
    pub scene: SceneConfig,
    pub candidates: CandidateConfig,
    pub extraction: ExtractionConfig,
    pub orientation: OrientationConfig,
    pub encoding: EncodingConfig,
    pub service: ServiceConfig,
}

/// Inclusive HSV box in OpenCV 8-bit units (H 0-180, S/V 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue: (f64, f64),
    pub saturation: (f64, f64),
    pub value: (f64, f64),
}

impl HsvRange {
    pub const fn new(hue: (f64, f64), saturation: (f64, f64), value: (f64, f64)) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Lower and upper bounds for `opencv::core::in_range`
    pub fn bounds(&self) -> (Scalar, Scalar) {
        (
            Scalar::new(self.hue.0, self.saturation.0, self.value.0, 0.0),
            Scalar::new(self.hue.1, self.saturation.1, self.value.1, 0.0),
        )
    }

    fn is_ordered(&self) -> bool {
        self.hue.0 <= self.hue.1 && self.saturation.0 <= self.saturation.1 && self.value.0 <= self.value.1
    }
}

/// Mask construction parameters.
///
/// One of three strategies runs per image; see
/// [`Segmenter`](crate::detection::Segmenter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Gaussian blur kernel size (must be odd)
    pub blur_kernel_size: i32,

    /// Scenes with mean luminance below this use the dark strategy
    pub dark_mean_luminance: f64,

    /// Intensity threshold isolating bright foreground on dark backdrops
    pub dark_foreground_threshold: f64,
    pub dark_canny: (f64, f64),

    pub light_canny: (f64, f64),
    /// Adaptive threshold neighborhood (must be odd and > 1)
    pub adaptive_block_size: i32,
    pub adaptive_bias: f64,
    /// Inverse threshold capturing cast shadows on light backdrops
    pub shadow_threshold: f64,

    /// Structuring element for dark/light cleanup
    pub morph_kernel_size: i32,
    pub close_iterations: i32,
    pub open_iterations: i32,

    /// Structuring element for the wood strategy
    pub wood_morph_kernel_size: i32,
    pub wood_canny: (f64, f64),
    /// Brown/tan tones removed from the wood mask
    pub wood_exclusion: HsvRange,
    /// Grayscale level counted as plastic reflection
    pub bright_threshold: f64,
    /// Blue slab and card tones kept on wood
    pub blue_range: HsvRange,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: segmentation::BLUR_KERNEL_SIZE,
            dark_mean_luminance: segmentation::DARK_MEAN_LUMINANCE,
            dark_foreground_threshold: segmentation::DARK_FOREGROUND_THRESHOLD,
            dark_canny: (segmentation::DARK_CANNY_LOW, segmentation::DARK_CANNY_HIGH),
            light_canny: (segmentation::LIGHT_CANNY_LOW, segmentation::LIGHT_CANNY_HIGH),
            adaptive_block_size: segmentation::ADAPTIVE_BLOCK_SIZE,
            adaptive_bias: segmentation::ADAPTIVE_BIAS,
            shadow_threshold: segmentation::SHADOW_THRESHOLD,
            morph_kernel_size: segmentation::MORPH_KERNEL_SIZE,
            close_iterations: segmentation::CLOSE_ITERATIONS,
            open_iterations: segmentation::OPEN_ITERATIONS,
            wood_morph_kernel_size: segmentation::WOOD_MORPH_KERNEL_SIZE,
            wood_canny: (segmentation::WOOD_CANNY_LOW, segmentation::WOOD_CANNY_HIGH),
            wood_exclusion: HsvRange::new(
                segmentation::WOOD_EXCLUDE_HUE,
                segmentation::WOOD_EXCLUDE_SATURATION,
                segmentation::WOOD_EXCLUDE_VALUE,
            ),
            bright_threshold: segmentation::BRIGHT_THRESHOLD,
            blue_range: HsvRange::new(
                segmentation::BLUE_HUE,
                segmentation::BLUE_SATURATION,
                segmentation::BLUE_VALUE,
            ),
        }
    }
}

/// Scene classifier thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub status_bar_height: f64,
    pub status_bar_max_spread: f64,
    pub status_bar_min_mean: f64,
    pub corner_height: f64,
    pub corner_width: f64,
    pub corner_min_edge_density: f64,
    /// Canny thresholds for the corner icon edges
    pub corner_canny: (f64, f64),
    pub text_strip_height: f64,
    pub text_strip_width: f64,
    pub text_strip_min_spread: f64,
    pub wood_range: HsvRange,
    /// Fraction of wood-colored pixels that flags a wood desk
    pub wood_min_fraction: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            status_bar_height: scene::STATUS_BAR_HEIGHT,
            status_bar_max_spread: scene::STATUS_BAR_MAX_SPREAD,
            status_bar_min_mean: scene::STATUS_BAR_MIN_MEAN,
            corner_height: scene::CORNER_HEIGHT,
            corner_width: scene::CORNER_WIDTH,
            corner_min_edge_density: scene::CORNER_MIN_EDGE_DENSITY,
            corner_canny: (scene::CORNER_CANNY_LOW, scene::CORNER_CANNY_HIGH),
            text_strip_height: scene::TEXT_STRIP_HEIGHT,
            text_strip_width: scene::TEXT_STRIP_WIDTH,
            text_strip_min_spread: scene::TEXT_STRIP_MIN_SPREAD,
            wood_range: HsvRange::new(scene::WOOD_HUE, scene::WOOD_SATURATION, scene::WOOD_VALUE),
            wood_min_fraction: scene::WOOD_MIN_FRACTION,
        }
    }
}

/// Geometric plausibility filters applied to every contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    /// Expected short/long side ratio
    pub card_aspect_ratio: f64,
    pub aspect_ratio_tolerance: f64,
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
    /// Polygon approximation epsilon as fraction of perimeter
    pub poly_approx_epsilon: f64,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            card_aspect_ratio: card::CARD_ASPECT_RATIO,
            aspect_ratio_tolerance: card::ASPECT_RATIO_TOLERANCE,
            min_area_ratio: card::MIN_CARD_AREA_RATIO,
            max_area_ratio: card::MAX_CARD_AREA_RATIO,
            min_vertices: card::MIN_VERTICES,
            max_vertices: card::MAX_VERTICES,
            poly_approx_epsilon: card::POLY_APPROX_EPSILON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fraction of each side trimmed from non-screenshot crops
    pub margin_inset_percent: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            margin_inset_percent: extraction::MARGIN_INSET_PERCENT,
        }
    }
}

/// Slab label color signatures used to pick a rotation direction.
///
/// Tuned for one grading company's slab styling (red modern border,
/// navy legacy label). Unlabeled cards fall back to clockwise rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Width of each inspected edge strip as fraction of crop width
    pub strip_fraction: f64,
    pub red_low: HsvRange,
    pub red_high: HsvRange,
    pub navy: HsvRange,
    /// Multiplier applied to navy pixel counts
    pub navy_weight: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            strip_fraction: extraction::LABEL_STRIP_FRACTION,
            red_low: HsvRange::new(
                extraction::RED_LOW_HUE,
                extraction::RED_SATURATION,
                extraction::RED_VALUE,
            ),
            red_high: HsvRange::new(
                extraction::RED_HIGH_HUE,
                extraction::RED_SATURATION,
                extraction::RED_VALUE,
            ),
            navy: HsvRange::new(
                extraction::NAVY_HUE,
                extraction::NAVY_SATURATION,
                extraction::NAVY_VALUE,
            ),
            navy_weight: extraction::NAVY_WEIGHT,
        }
    }
}

/// PNG compression effort. Output is lossless at every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EncodingConfig {
    pub compression: PngCompression,
}

/// Limits enforced by the transport before and around a pipeline call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub max_image_size_mb: u64,
    pub crop_timeout_seconds: u64,
}

impl ServiceConfig {
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb * 1024 * 1024
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.crop_timeout_seconds)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_image_size_mb: service::MAX_IMAGE_SIZE_MB,
            crop_timeout_seconds: service::CROP_TIMEOUT.as_secs(),
        }
    }
}

impl CropConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CropError::config(format!("cannot read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CropError::config(format!("cannot parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CropError::config("cannot serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| CropError::config(format!("cannot write {}", path.display()), e))?;
        Ok(())
    }

    /// Reject tunings the OpenCV calls or the filters cannot work with
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmentation;
        for (name, size) in [
            ("segmentation.blur_kernel_size", seg.blur_kernel_size),
            ("segmentation.morph_kernel_size", seg.morph_kernel_size),
            ("segmentation.wood_morph_kernel_size", seg.wood_morph_kernel_size),
        ] {
            if size < 1 || size % 2 == 0 {
                return Err(CropError::invalid_parameter(name, size));
            }
        }
        if seg.adaptive_block_size < 3 || seg.adaptive_block_size % 2 == 0 {
            return Err(CropError::invalid_parameter(
                "segmentation.adaptive_block_size",
                seg.adaptive_block_size,
            ));
        }
        for (name, range) in [
            ("segmentation.wood_exclusion", &seg.wood_exclusion),
            ("segmentation.blue_range", &seg.blue_range),
            ("scene.wood_range", &self.scene.wood_range),
            ("orientation.red_low", &self.orientation.red_low),
            ("orientation.red_high", &self.orientation.red_high),
            ("orientation.navy", &self.orientation.navy),
        ] {
            if !range.is_ordered() {
                return Err(CropError::invalid_parameter(name, format!("{:?}", range)));
            }
        }

        for (name, (low, high)) in [
            ("segmentation.dark_canny", seg.dark_canny),
            ("segmentation.light_canny", seg.light_canny),
            ("segmentation.wood_canny", seg.wood_canny),
            ("scene.corner_canny", self.scene.corner_canny),
        ] {
            if low < 0.0 || low > high {
                return Err(CropError::invalid_parameter(name, format!("{}..{}", low, high)));
            }
        }

        let cand = &self.candidates;
        if !(0.0..=1.0).contains(&cand.min_area_ratio)
            || !(0.0..=1.0).contains(&cand.max_area_ratio)
            || cand.min_area_ratio > cand.max_area_ratio
        {
            return Err(CropError::invalid_parameter(
                "candidates.area_ratio",
                format!("{}..{}", cand.min_area_ratio, cand.max_area_ratio),
            ));
        }
        if cand.min_vertices < 3 || cand.min_vertices > cand.max_vertices {
            return Err(CropError::invalid_parameter(
                "candidates.vertices",
                format!("{}..{}", cand.min_vertices, cand.max_vertices),
            ));
        }
        if cand.card_aspect_ratio <= 0.0 || cand.card_aspect_ratio > 1.0 {
            return Err(CropError::invalid_parameter(
                "candidates.card_aspect_ratio",
                cand.card_aspect_ratio,
            ));
        }
        if cand.poly_approx_epsilon <= 0.0 {
            return Err(CropError::invalid_parameter(
                "candidates.poly_approx_epsilon",
                cand.poly_approx_epsilon,
            ));
        }

        if !(0.0..0.5).contains(&self.extraction.margin_inset_percent) {
            return Err(CropError::invalid_parameter(
                "extraction.margin_inset_percent",
                self.extraction.margin_inset_percent,
            ));
        }
        if self.orientation.strip_fraction <= 0.0 || self.orientation.strip_fraction > 0.5 {
            return Err(CropError::invalid_parameter(
                "orientation.strip_fraction",
                self.orientation.strip_fraction,
            ));
        }
        if self.service.max_image_size_mb == 0 {
            return Err(CropError::invalid_parameter("service.max_image_size_mb", 0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CropConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.candidates.min_vertices, 4);
        assert_eq!(config.candidates.max_vertices, 12);
        assert_eq!(config.segmentation.wood_morph_kernel_size, 7);
        assert_eq!(config.service.max_image_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.service.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.json");

        let mut config = CropConfig::default();
        config.extraction.margin_inset_percent = 0.0;
        config.encoding.compression = PngCompression::Best;
        config.to_json_file(&path).unwrap();

        let loaded = CropConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "candidates": { "min_area_ratio": 0.1 } }"#;
        let config: CropConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.candidates.min_area_ratio, 0.1);
        assert_eq!(config.candidates.max_area_ratio, card::MAX_CARD_AREA_RATIO);
        assert_eq!(config.segmentation, SegmentationConfig::default());
    }

    #[test]
    fn test_validate_rejects_even_kernel() {
        let mut config = CropConfig::default();
        config.segmentation.morph_kernel_size = 4;
        assert!(matches!(
            config.validate(),
            Err(CropError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_area_bounds() {
        let mut config = CropConfig::default();
        config.candidates.min_area_ratio = 0.8;
        config.candidates.max_area_ratio = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_corner_canny() {
        let mut config = CropConfig::default();
        config.scene.corner_canny = (150.0, 50.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = CropConfig::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, CropError::Config { .. }));
    }

    #[test]
    fn test_hsv_bounds() {
        let range = HsvRange::new((105.0, 125.0), (50.0, 200.0), (20.0, 150.0));
        let (lower, upper) = range.bounds();
        assert_eq!(lower[0], 105.0);
        assert_eq!(upper[1], 200.0);
        assert_eq!(upper[2], 150.0);
    }
}
