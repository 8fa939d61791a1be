//! Image decoding, encoding and upload validation
//!
//! The pipeline works on OpenCV `Mat`s in BGR order. This module is the only
//! place that crosses between encoded bytes and `Mat`:
//!
//! - [`decode_image`]: JPEG/PNG/... bytes (via the `image` crate) with EXIF
//!   orientation applied, converted to an 8-bit BGR `Mat`
//! - [`encode_png`]: BGR `Mat` to lossless RGB PNG bytes
//! - [`validate_upload`]: MIME type and size checks the transport runs before
//!   handing bytes to the pipeline

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::prelude::*;

use crate::config::{PngCompression, ServiceConfig};
use crate::error::{CropError, Result};
use crate::metadata::ExifExtractor;

/// Formats the transport advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Detect format from a MIME content type
    pub fn from_content_type(content_type: &str) -> Option<ImageFormat> {
        let essence = content_type.split(';').next()?.trim().to_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::WebP),
            "image/bmp" => Some(ImageFormat::Bmp),
            "image/tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }
}

/// Decode raw image bytes into a BGR `Mat`, honoring EXIF orientation
///
/// # Errors
///
/// Returns `CropError::ImageDecode` if the bytes are empty or not a
/// decodable image.
///
/// # Example
///
/// ```rust,no_run
/// use slab_crop::image_loader::decode_image;
/// use opencv::prelude::*;
///
/// let bytes = std::fs::read("slab.jpg")?;
/// let mat = decode_image(&bytes)?;
/// println!("Decoded image: {}x{}", mat.cols(), mat.rows());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_image(bytes: &[u8]) -> Result<Mat> {
    if bytes.is_empty() {
        return Err(CropError::ImageDecode {
            message: "Invalid image format".into(),
            source: None,
        });
    }

    let decoded: DynamicImage = image::load_from_memory(bytes)
        .map_err(|e| CropError::decode("Invalid image format", e))?;

    let upright = match ExifExtractor::orientation(bytes) {
        Some(orientation) => {
            tracing::debug!("Applying EXIF orientation {:?}", orientation);
            orientation.apply(decoded)
        }
        None => decoded,
    };

    let rgb = upright.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(CropError::ImageDecode {
            message: "Image has no pixels".into(),
            source: None,
        });
    }

    rgb_to_bgr_mat(rgb.as_raw(), width as i32, height as i32)
}

/// Encode a BGR `Mat` as an RGB PNG (no alpha channel)
pub fn encode_png(image: &Mat, compression: PngCompression) -> Result<Vec<u8>> {
    let rgb = bgr_mat_to_rgb(image)?;
    let (width, height) = rgb.dimensions();

    let compression = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };

    let mut buffer = Vec::new();
    PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive)
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CropError::encode("PNG encoding failed", e))?;

    Ok(buffer)
}

/// Reject uploads the pipeline should never see.
///
/// Mirrors the transport contract: the content type must be an image type
/// and the payload must fit within `service.max_image_size_mb`.
pub fn validate_upload(bytes: &[u8], content_type: Option<&str>, service: &ServiceConfig) -> Result<()> {
    let is_image = content_type
        .map(|ct| ct.trim().to_lowercase().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(CropError::InvalidUpload {
            reason: "File must be an image (JPEG or PNG)".into(),
        });
    }

    if bytes.is_empty() {
        return Err(CropError::InvalidUpload {
            reason: "File is empty".into(),
        });
    }

    if bytes.len() as u64 > service.max_image_bytes() {
        let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
        return Err(CropError::InvalidUpload {
            reason: format!(
                "File size ({:.2}MB) exceeds maximum allowed size ({}MB)",
                size_mb, service.max_image_size_mb
            ),
        });
    }

    Ok(())
}

/// Convert RGB byte buffer to OpenCV BGR Mat
fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    let expected = (width as usize) * (height as usize) * 3;
    if rgb_data.len() != expected {
        return Err(CropError::ImageDecode {
            message: format!("pixel buffer holds {} bytes, expected {}", rgb_data.len(), expected),
            source: None,
        });
    }

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
        .map_err(|e| CropError::opencv("Mat allocation", e))?;

    let dst = mat
        .data_bytes_mut()
        .map_err(|e| CropError::opencv("Mat data access", e))?;
    for (bgr, rgb) in dst.chunks_exact_mut(3).zip(rgb_data.chunks_exact(3)) {
        bgr[0] = rgb[2];
        bgr[1] = rgb[1];
        bgr[2] = rgb[0];
    }

    Ok(mat)
}

/// Convert an 8-bit BGR Mat to an `image` RGB buffer
fn bgr_mat_to_rgb(image: &Mat) -> Result<RgbImage> {
    if image.typ() != CV_8UC3 {
        return Err(CropError::invalid_parameter("image type", image.typ()));
    }

    // ROI views are not continuous; copy them into their own buffer first
    let owned;
    let source = if image.is_continuous() {
        image
    } else {
        owned = image
            .try_clone()
            .map_err(|e| CropError::opencv("Mat clone", e))?;
        &owned
    };

    let bgr = source
        .data_bytes()
        .map_err(|e| CropError::opencv("Mat data access", e))?;
    let mut rgb = Vec::with_capacity(bgr.len());
    for px in bgr.chunks_exact(3) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }

    RgbImage::from_raw(source.cols() as u32, source.rows() as u32, rgb).ok_or_else(|| {
        CropError::Encode {
            message: "pixel buffer does not match image dimensions".into(),
            source: None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat as Codec, Rgb};
    use opencv::core::Vec3b;
    use std::io::Cursor;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, Codec::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(ImageFormat::from_content_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_content_type("image/png; charset=binary"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_content_type("text/plain"), None);
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_rgb_to_bgr_conversion() {
        // Test 2x2 image: red, green, blue, white
        let rgb_data = vec![
            255, 0, 0,    // Red
            0, 255, 0,    // Green
            0, 0, 255,    // Blue
            255, 255, 255 // White
        ];

        let mat = rgb_to_bgr_mat(&rgb_data, 2, 2).unwrap();

        let red: &Vec3b = mat.at_2d(0, 0).unwrap();
        assert_eq!((red[0], red[1], red[2]), (0, 0, 255));
        let green: &Vec3b = mat.at_2d(0, 1).unwrap();
        assert_eq!((green[0], green[1], green[2]), (0, 255, 0));
        let blue: &Vec3b = mat.at_2d(1, 0).unwrap();
        assert_eq!((blue[0], blue[1], blue[2]), (255, 0, 0));
    }

    #[test]
    fn test_rgb_buffer_size_mismatch() {
        assert!(rgb_to_bgr_mat(&[0, 0, 0], 2, 2).is_err());
    }

    #[test]
    fn test_decode_png_dimensions() {
        let mut img = RgbImage::from_pixel(30, 20, Rgb([10, 20, 30]));
        img.put_pixel(0, 0, Rgb([200, 100, 50]));

        let mat = decode_image(&png_bytes(&img)).unwrap();
        assert_eq!(mat.cols(), 30);
        assert_eq!(mat.rows(), 20);
        let px: &Vec3b = mat.at_2d(0, 0).unwrap();
        assert_eq!((px[0], px[1], px[2]), (50, 100, 200));
    }

    #[test]
    fn test_decode_applies_exif_rotation() {
        use crate::metadata::extractor::test_support::jpeg_with_orientation;

        // Stored 40x20 landscape, tagged "rotate 90 to display"
        let mat = decode_image(&jpeg_with_orientation(40, 20, 6)).unwrap();
        assert_eq!((mat.cols(), mat.rows()), (20, 40));

        let untouched = decode_image(&jpeg_with_orientation(40, 20, 1)).unwrap();
        assert_eq!((untouched.cols(), untouched.rows()), (40, 20));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CropError::ImageDecode { .. }));
        assert!(matches!(decode_image(&[]), Err(CropError::ImageDecode { .. })));
    }

    #[test]
    fn test_encode_png_is_lossless() {
        let mut img = RgbImage::from_pixel(8, 5, Rgb([1, 2, 3]));
        img.put_pixel(7, 4, Rgb([250, 128, 7]));
        let mat = decode_image(&png_bytes(&img)).unwrap();

        let encoded = encode_png(&mat, PngCompression::Best).unwrap();
        let round = image::load_from_memory(&encoded).unwrap();
        assert_eq!(round.color(), image::ColorType::Rgb8);
        assert_eq!(round.to_rgb8(), img);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 90]));
        let mat = decode_image(&png_bytes(&img)).unwrap();
        let a = encode_png(&mat, PngCompression::Default).unwrap();
        let b = encode_png(&mat, PngCompression::Default).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_upload() {
        let service = ServiceConfig {
            max_image_size_mb: 1,
            ..ServiceConfig::default()
        };
        assert!(validate_upload(&[1, 2, 3], Some("image/png"), &service).is_ok());

        let err = validate_upload(&[1, 2, 3], Some("application/pdf"), &service).unwrap_err();
        assert_eq!(err.user_message(), "File must be an image (JPEG or PNG)");
        assert!(validate_upload(&[1, 2, 3], None, &service).is_err());
        assert!(validate_upload(&[], Some("image/jpeg"), &service).is_err());

        let big = vec![0u8; 1024 * 1024 + 1];
        match validate_upload(&big, Some("image/jpeg"), &service) {
            Err(CropError::InvalidUpload { reason }) => {
                assert_eq!(reason, "File size (1.00MB) exceeds maximum allowed size (1MB)");
            }
            other => panic!("expected InvalidUpload, got {:?}", other),
        }
    }
}
