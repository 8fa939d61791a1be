//! EXIF orientation extraction
//!
//! Reads the Orientation tag from an encoded image container and applies
//! the corresponding flip/rotation to a decoded image.

use image::DynamicImage;
use std::io::Cursor;

/// Display transform recorded in EXIF tag 0x0112
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    /// 1: stored upright
    Normal,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5: transpose
    Rotate90FlipHorizontal,
    /// 6
    Rotate90,
    /// 7: transverse
    Rotate270FlipHorizontal,
    /// 8
    Rotate270,
}

impl ExifOrientation {
    /// Map a raw EXIF value; anything outside 1-8 is ignored
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Rotate90FlipHorizontal),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Rotate270FlipHorizontal),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// Whether applying this transform swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Rotate90FlipHorizontal | Self::Rotate270FlipHorizontal
        )
    }

    /// Apply the transform so the image displays upright
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => image,
            Self::FlipHorizontal => image.fliph(),
            Self::Rotate180 => image.rotate180(),
            Self::FlipVertical => image.flipv(),
            Self::Rotate90FlipHorizontal => image.rotate90().fliph(),
            Self::Rotate90 => image.rotate90(),
            Self::Rotate270FlipHorizontal => image.rotate270().fliph(),
            Self::Rotate270 => image.rotate270(),
        }
    }
}

/// EXIF metadata extractor
pub struct ExifExtractor;

impl ExifExtractor {
    /// Read the orientation tag from encoded image bytes.
    ///
    /// Returns `None` when the container carries no EXIF block, the tag is
    /// absent, or the block is unreadable. A broken EXIF block never makes
    /// an otherwise decodable photo fail.
    pub fn orientation(bytes: &[u8]) -> Option<ExifOrientation> {
        let reader = ::exif::Reader::new();
        let exif = match reader.read_from_container(&mut Cursor::new(bytes)) {
            Ok(exif) => exif,
            Err(e) => {
                tracing::debug!("No usable EXIF block: {}", e);
                return None;
            }
        };

        let field = exif.get_field(::exif::Tag::Orientation, ::exif::In::PRIMARY)?;
        let raw = field.value.get_uint(0)?;
        let orientation = ExifOrientation::from_exif(raw);
        if orientation.is_none() {
            tracing::debug!("Ignoring out-of-range EXIF orientation {}", raw);
        }
        orientation
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::jpeg_with_orientation;
    use super::*;
    use image::{Rgb, RgbImage};

    fn two_by_one() -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_orientation_parsing() {
        assert_eq!(ExifOrientation::from_exif(1), Some(ExifOrientation::Normal));
        assert_eq!(ExifOrientation::from_exif(6), Some(ExifOrientation::Rotate90));
        assert_eq!(ExifOrientation::from_exif(8), Some(ExifOrientation::Rotate270));
        assert_eq!(ExifOrientation::from_exif(0), None);
        assert_eq!(ExifOrientation::from_exif(9), None);
    }

    #[test]
    fn test_rotate90_swaps_dimensions() {
        let rotated = ExifOrientation::Rotate90.apply(two_by_one()).to_rgb8();
        assert_eq!(rotated.dimensions(), (1, 2));
        // Clockwise: the left pixel ends up on top
        assert_eq!(rotated.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert!(ExifOrientation::Rotate90.swaps_dimensions());
        assert!(!ExifOrientation::Rotate180.swaps_dimensions());
    }

    #[test]
    fn test_flip_horizontal() {
        let flipped = ExifOrientation::FlipHorizontal.apply(two_by_one()).to_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(flipped.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_transpose_keeps_origin() {
        let transposed = ExifOrientation::Rotate90FlipHorizontal
            .apply(two_by_one())
            .to_rgb8();
        assert_eq!(transposed.dimensions(), (1, 2));
        assert_eq!(transposed.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(transposed.get_pixel(0, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_orientation_read_from_jpeg() {
        let bytes = jpeg_with_orientation(40, 20, 6);
        assert_eq!(ExifExtractor::orientation(&bytes), Some(ExifOrientation::Rotate90));
        assert_eq!(
            ExifExtractor::orientation(&jpeg_with_orientation(40, 20, 8)),
            Some(ExifOrientation::Rotate270)
        );
        // Out-of-range value is ignored
        assert_eq!(ExifExtractor::orientation(&jpeg_with_orientation(40, 20, 42)), None);
        // The fixture is still a decodable JPEG
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 40);
    }

    #[test]
    fn test_no_exif_in_garbage() {
        assert_eq!(ExifExtractor::orientation(b"not an image"), None);
        assert_eq!(ExifExtractor::orientation(&[]), None);
    }
}
