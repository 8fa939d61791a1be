//! # Slab Crop
//!
//! A Rust crate for locating a trading card, or a graded slab holding one,
//! in an arbitrary photograph and returning a clean, upright crop.
//!
//! This library produces the crop by:
//! - Classifying the background (dark, light, wood) and screenshot UI
//! - Building a background-adaptive foreground mask
//! - Scoring card-shaped contours and keeping the best one
//! - Cropping the winning box and turning sideways slabs upright
//!
//! ## Example
//!
//! ```rust,no_run
//! use slab_crop::crop_card;
//!
//! let bytes = std::fs::read("slab.jpg")?;
//! let result = crop_card(&bytes);
//! if result.success {
//!     println!("confidence {:.2}, size {:?}", result.confidence.unwrap_or(0.0), result.cropped_size);
//! } else {
//!     eprintln!("{}", result.message);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod extraction;
pub mod image_loader;
pub mod metadata;
pub mod pipeline;
pub mod response;
pub mod storage;

pub use config::CropConfig;
pub use detection::{BoundingBox, DetectionResult, SceneKind};
pub use error::{CropError, Result};
pub use extraction::Rotation;
pub use image_loader::{validate_upload, ImageFormat};
pub use pipeline::{CardCropper, CropResult, EncodedImage};
pub use response::CropResponse;
pub use storage::{LocalDirUploader, StorageUploader, UploadReceipt, UploadRequest};

/// Crop the card in an encoded photo with the default tuning
///
/// Never fails outward: decode errors, missing cards and extraction
/// problems are reported through [`CropResult::success`] and
/// [`CropResult::message`].
pub fn crop_card(bytes: &[u8]) -> CropResult {
    CardCropper::new().crop_card(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_result_serialization() {
        let result = DetectionResult {
            bbox: BoundingBox::new(200, 280, 600, 840),
            confidence: 0.985,
            is_screenshot: false,
            scene: SceneKind::Dark,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"scene\":\"dark\""));
        let deserialized: DetectionResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result, deserialized);
    }

    #[test]
    fn test_empty_input_is_a_failed_result() {
        let result = crop_card(&[]);
        assert!(!result.success);
        assert_eq!(result.message, "Failed to decode image");
    }
}
