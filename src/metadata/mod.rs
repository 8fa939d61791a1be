//! Image metadata handling
//!
//! Phone photos often store pixels in sensor order and record the intended
//! display rotation in the EXIF Orientation tag. The tag has to be applied
//! before detection, otherwise a portrait slab arrives sideways.

pub mod extractor;

pub use extractor::{ExifExtractor, ExifOrientation};
