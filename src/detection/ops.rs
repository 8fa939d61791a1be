//! Thin wrappers over the OpenCV calls shared by the detection and
//! extraction stages. Each returns a freshly allocated `Mat` and maps
//! OpenCV failures to [`CropError::OpenCv`].

use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, BORDER_CONSTANT},
    imgproc::{self, COLOR_BGR2GRAY, COLOR_BGR2HSV, MORPH_RECT, THRESH_BINARY},
    prelude::*,
};

use crate::config::HsvRange;
use crate::error::{CropError, Result};

pub(crate) fn grayscale(image: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, COLOR_BGR2GRAY)
        .map_err(|e| CropError::opencv("Grayscale conversion", e))?;
    Ok(gray)
}

pub(crate) fn hsv(image: &Mat) -> Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(image, &mut hsv, COLOR_BGR2HSV)
        .map_err(|e| CropError::opencv("HSV conversion", e))?;
    Ok(hsv)
}

pub(crate) fn blur(gray: &Mat, kernel_size: i32) -> Result<Mat> {
    let mut blurred = Mat::default();
    imgproc::gaussian_blur_def(gray, &mut blurred, Size::new(kernel_size, kernel_size), 0.0)
        .map_err(|e| CropError::opencv("Gaussian blur", e))?;
    Ok(blurred)
}

pub(crate) fn canny(gray: &Mat, (low, high): (f64, f64)) -> Result<Mat> {
    let mut edges = Mat::default();
    imgproc::canny(gray, &mut edges, low, high, 3, false)
        .map_err(|e| CropError::opencv("Canny edge detection", e))?;
    Ok(edges)
}

/// Fixed-level threshold; `threshold_type` is `THRESH_BINARY` or `THRESH_BINARY_INV`
pub(crate) fn threshold(gray: &Mat, level: f64, threshold_type: i32) -> Result<Mat> {
    let mut binary = Mat::default();
    imgproc::threshold(gray, &mut binary, level, 255.0, threshold_type)
        .map_err(|e| CropError::opencv("Threshold", e))?;
    Ok(binary)
}

pub(crate) fn bright_pixels(gray: &Mat, level: f64) -> Result<Mat> {
    threshold(gray, level, THRESH_BINARY)
}

/// 255 where the HSV pixel falls inside `range`
pub(crate) fn in_range(hsv: &Mat, range: &HsvRange) -> Result<Mat> {
    let (lower, upper) = range.bounds();
    let mut mask = Mat::default();
    core::in_range(hsv, &lower, &upper, &mut mask)
        .map_err(|e| CropError::opencv("HSV range mask", e))?;
    Ok(mask)
}

pub(crate) fn count_in_range(hsv: &Mat, range: &HsvRange) -> Result<i32> {
    let mask = in_range(hsv, range)?;
    count_non_zero(&mask)
}

pub(crate) fn count_non_zero(mask: &Mat) -> Result<i32> {
    core::count_non_zero(mask).map_err(|e| CropError::opencv("Count non-zero", e))
}

pub(crate) fn bitwise_or(a: &Mat, b: &Mat) -> Result<Mat> {
    let mut result = Mat::default();
    core::bitwise_or(a, b, &mut result, &Mat::default())
        .map_err(|e| CropError::opencv("Mask union", e))?;
    Ok(result)
}

pub(crate) fn bitwise_and(a: &Mat, b: &Mat) -> Result<Mat> {
    let mut result = Mat::default();
    core::bitwise_and(a, b, &mut result, &Mat::default())
        .map_err(|e| CropError::opencv("Mask intersection", e))?;
    Ok(result)
}

pub(crate) fn bitwise_not(mask: &Mat) -> Result<Mat> {
    let mut inverted = Mat::default();
    core::bitwise_not(mask, &mut inverted, &Mat::default())
        .map_err(|e| CropError::opencv("Mask inversion", e))?;
    Ok(inverted)
}

/// Union of any number of same-size masks
pub(crate) fn union_all(masks: &[&Mat]) -> Result<Mat> {
    let (first, rest) = masks
        .split_first()
        .ok_or_else(|| CropError::invalid_parameter("masks", "empty"))?;
    let mut combined = first.try_clone().map_err(|e| CropError::opencv("Mat clone", e))?;
    for mask in rest {
        combined = bitwise_or(&combined, mask)?;
    }
    Ok(combined)
}

/// Close then open with a square structuring element
pub(crate) fn close_then_open(
    mask: &Mat,
    kernel_size: i32,
    close_iterations: i32,
    open_iterations: i32,
) -> Result<Mat> {
    let kernel = imgproc::get_structuring_element(
        MORPH_RECT,
        Size::new(kernel_size, kernel_size),
        Point::new(-1, -1),
    )
    .map_err(|e| CropError::opencv("Kernel creation", e))?;
    let border_value = imgproc::morphology_default_border_value()
        .map_err(|e| CropError::opencv("Morphology border value", e))?;

    let mut closed = Mat::default();
    imgproc::morphology_ex(
        mask,
        &mut closed,
        imgproc::MORPH_CLOSE,
        &kernel,
        Point::new(-1, -1),
        close_iterations,
        BORDER_CONSTANT,
        border_value,
    )
    .map_err(|e| CropError::opencv("Closing operation", e))?;

    let mut opened = Mat::default();
    imgproc::morphology_ex(
        &closed,
        &mut opened,
        imgproc::MORPH_OPEN,
        &kernel,
        Point::new(-1, -1),
        open_iterations,
        BORDER_CONSTANT,
        border_value,
    )
    .map_err(|e| CropError::opencv("Opening operation", e))?;

    Ok(opened)
}

/// Owned copy of a rectangular region
pub(crate) fn roi(image: &Mat, rect: Rect) -> Result<Mat> {
    let view = Mat::roi(image, rect).map_err(|e| CropError::opencv("Region of interest", e))?;
    view.try_clone().map_err(|e| CropError::opencv("Mat clone", e))
}

/// Mean and standard deviation of a single-channel image
pub(crate) fn mean_std_dev(gray: &Mat) -> Result<(f64, f64)> {
    let mut mean = Mat::default();
    let mut std_dev = Mat::default();
    core::mean_std_dev(gray, &mut mean, &mut std_dev, &Mat::default())
        .map_err(|e| CropError::opencv("Mean/std-dev", e))?;
    let mean = *mean.at::<f64>(0).map_err(|e| CropError::opencv("Mean access", e))?;
    let std_dev = *std_dev
        .at::<f64>(0)
        .map_err(|e| CropError::opencv("Std-dev access", e))?;
    Ok((mean, std_dev))
}

pub(crate) fn mean(gray: &Mat) -> Result<f64> {
    let mean: Scalar = core::mean(gray, &Mat::default()).map_err(|e| CropError::opencv("Mean", e))?;
    Ok(mean[0])
}
