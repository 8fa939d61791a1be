//! End-to-end cropping facade
//!
//! [`CardCropper`] turns encoded photo bytes into a [`CropResult`]. Every
//! failure is folded into the result; nothing is returned as `Err` and
//! nothing panics outward.

use opencv::{core::Mat, prelude::*};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::CropConfig;
use crate::detection::{CardDetector, DetectionResult};
use crate::error::{CropError, Result};
use crate::extraction::{OrientationCorrector, RegionExtractor};
use crate::image_loader::{decode_image, encode_png, ImageFormat};
use crate::storage::{StorageUploader, UploadReceipt, UploadRequest};

pub const SUCCESS_MESSAGE: &str = "Card successfully detected and cropped";

/// Lossless crop bytes and their format
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Outcome of one pipeline call
#[derive(Debug, Clone, PartialEq)]
pub struct CropResult {
    pub success: bool,
    pub image: Option<EncodedImage>,
    /// Absent when the image could not be decoded
    pub confidence: Option<f32>,
    pub message: String,
    pub error: Option<String>,
    /// `(width, height)` after EXIF orientation
    pub original_size: Option<(u32, u32)>,
    pub cropped_size: Option<(u32, u32)>,
    pub detection: Option<DetectionResult>,
    pub upload: Option<UploadReceipt>,
    pub upload_error: Option<String>,
}

impl CropResult {
    fn success(
        image: EncodedImage,
        detection: DetectionResult,
        original_size: (u32, u32),
        cropped_size: (u32, u32),
    ) -> Self {
        Self {
            success: true,
            image: Some(image),
            confidence: Some(detection.confidence),
            message: SUCCESS_MESSAGE.to_string(),
            error: None,
            original_size: Some(original_size),
            cropped_size: Some(cropped_size),
            detection: Some(detection),
            upload: None,
            upload_error: None,
        }
    }

    /// Failed result describing `error`
    pub fn failure(error: &CropError, original_size: Option<(u32, u32)>) -> Self {
        let (confidence, message, detail) = match error {
            CropError::ImageDecode { message, .. } => {
                (None, error.user_message(), Some(message.clone()))
            }
            CropError::NoCandidate { .. } => (Some(0.0), error.user_message(), None),
            CropError::Extraction { confidence, .. } => {
                (Some(*confidence), error.user_message(), Some(error.to_string()))
            }
            _ => (None, error.user_message(), Some(error.to_string())),
        };

        Self {
            success: false,
            image: None,
            confidence,
            message,
            error: detail,
            original_size,
            cropped_size: None,
            detection: None,
            upload: None,
            upload_error: None,
        }
    }
}

/// Successful run before it is packed into a [`CropResult`]
struct Cropped {
    png: Vec<u8>,
    detection: DetectionResult,
    size: (u32, u32),
}

/// Card cropping pipeline bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct CardCropper {
    config: CropConfig,
}

impl CardCropper {
    /// Cropper with the default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Cropper with a custom tuning
    ///
    /// # Errors
    ///
    /// Returns `CropError::InvalidParameter` if the configuration fails
    /// [`CropConfig::validate`].
    pub fn with_config(config: CropConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Detect, crop, orient and encode the card in `bytes`
    pub fn crop_card(&self, bytes: &[u8]) -> CropResult {
        // Step 1: Decode
        let image = match decode_image(bytes) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Failed to decode image: {}", e);
                return CropResult::failure(&e, None);
            }
        };
        let original_size = (image.cols() as u32, image.rows() as u32);
        tracing::info!("Processing image of size {}x{}", original_size.0, original_size.1);

        // Steps 2-5: Detect, extract, orient, encode
        match self.process(&image) {
            Ok(cropped) => {
                tracing::info!(
                    confidence = cropped.detection.confidence,
                    "Cropped card to {}x{}",
                    cropped.size.0,
                    cropped.size.1
                );
                CropResult::success(
                    EncodedImage {
                        bytes: cropped.png,
                        format: ImageFormat::Png,
                    },
                    cropped.detection,
                    original_size,
                    cropped.size,
                )
            }
            Err(e) => {
                tracing::warn!("Cropping failed: {}", e);
                CropResult::failure(&e, Some(original_size))
            }
        }
    }

    fn process(&self, image: &Mat) -> Result<Cropped> {
        let detection = CardDetector::new(&self.config)
            .detect(image)?
            .ok_or_else(|| CropError::NoCandidate {
                reason: "no contour passed the geometric filters".into(),
            })?;

        let crop = RegionExtractor::new(&self.config.extraction)
            .extract(image, detection.bbox, !detection.is_screenshot)
            .and_then(|crop| OrientationCorrector::new(&self.config.orientation).normalize_orientation(crop))
            .map_err(|e| match e {
                CropError::Extraction { reason, .. } => CropError::Extraction {
                    reason,
                    confidence: detection.confidence,
                },
                other => other,
            })?;

        if crop.cols() <= 0 || crop.rows() <= 0 {
            return Err(CropError::Extraction {
                reason: "empty crop".into(),
                confidence: detection.confidence,
            });
        }

        let png = encode_png(&crop, self.config.encoding.compression)?;
        Ok(Cropped {
            png,
            detection,
            size: (crop.cols() as u32, crop.rows() as u32),
        })
    }

    /// [`crop_card`](Self::crop_card) bounded by a wall-clock budget.
    ///
    /// The pipeline runs on a worker thread. When the budget elapses the
    /// caller gets a `Timeout` failure at once; the worker finishes in the
    /// background and its result is dropped. A timed-out result carries no
    /// `original_size` since the decode may not have happened yet.
    pub fn crop_card_within(&self, bytes: &[u8], budget: Duration) -> CropResult {
        let cropper = self.clone();
        let owned = bytes.to_vec();
        run_within(budget, move || cropper.crop_card(&owned))
    }

    /// Crop and, on success, hand the PNG to `uploader`.
    ///
    /// Upload failures are reported in `upload_error`; `success` still
    /// reflects detection only.
    pub fn crop_and_store(
        &self,
        bytes: &[u8],
        uploader: &dyn StorageUploader,
        user_id: Option<&str>,
        card_id: Option<&str>,
    ) -> CropResult {
        let mut result = self.crop_card(bytes);
        let png = match result.image.as_ref() {
            Some(image) if result.success => image.bytes.clone(),
            _ => return result,
        };

        let mut request = UploadRequest::png(png);
        request.user_id = user_id.map(str::to_string);
        request.card_id = card_id.map(str::to_string);
        if let Some(confidence) = result.confidence {
            request = request.with_metadata("confidence", format!("{:.4}", confidence));
        }
        if let Some((w, h)) = result.original_size {
            request = request.with_metadata("original_size", format!("{}x{}", w, h));
        }
        if let Some((w, h)) = result.cropped_size {
            request = request.with_metadata("cropped_size", format!("{}x{}", w, h));
        }

        match uploader.upload(&request) {
            Ok(receipt) => {
                tracing::info!("Stored crop at {}", receipt.object_path);
                result.upload = Some(receipt);
            }
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                result.upload_error = Some(e.to_string());
            }
        }
        result
    }
}

/// Run `job` on a named worker thread and wait at most `budget` for it.
///
/// Falls back to running inline if the thread cannot be spawned.
fn run_within<F>(budget: Duration, job: F) -> CropResult
where
    F: Fn() -> CropResult + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let worker_job = Arc::clone(&job);
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    let spawned = thread::Builder::new()
        .name("slab-crop".into())
        .spawn(move || {
            let _ = tx.send(worker_job());
        });
    if let Err(e) = spawned {
        tracing::error!("Could not start cropping worker: {}", e);
        return job();
    }

    match rx.recv_timeout(budget) {
        Ok(result) => result,
        Err(_) => {
            let error = CropError::Timeout {
                duration_ms: started.elapsed().as_millis() as u64,
                limit_ms: budget.as_millis() as u64,
            };
            tracing::warn!("{}", error);
            CropResult::failure(&error, None)
        }
    }
}
