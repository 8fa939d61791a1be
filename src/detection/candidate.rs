//! Contour-based card candidates
//!
//! Finds outer contours in a foreground mask and keeps the ones whose
//! geometry could be a card or slab. Nested contours are never visited, so
//! a slab wins over the card visible through its window.

use opencv::{
    core::{Mat, Point, Rect, Vector},
    imgproc::{
        approx_poly_dp, arc_length, bounding_rect, contour_area, convex_hull, find_contours,
        CHAIN_APPROX_SIMPLE, RETR_EXTERNAL,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::config::CandidateConfig;
use crate::error::{CropError, Result};

type VectorOfPoint = Vector<Point>;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Shrink each side by `percent` of that side's length.
    ///
    /// The result may be empty or negative-sized; callers clamp it.
    pub fn inset(&self, percent: f64) -> Self {
        let dx = (self.width as f64 * percent).round() as i32;
        let dy = (self.height as f64 * percent).round() as i32;
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width - 2 * dx,
            height: self.height - 2 * dy,
        }
    }

    /// Intersect with a `width x height` image; `None` if nothing is left
    pub fn clamp_to(&self, width: i32, height: i32) -> Option<Self> {
        let x0 = self.x.clamp(0, width);
        let y0 = self.y.clamp(0, height);
        let x1 = (self.x + self.width).clamp(0, width);
        let y1 = (self.y + self.height).clamp(0, height);
        (x1 > x0 && y1 > y0).then(|| Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Whether the box touches all four borders of a `width x height` frame
    pub fn spans_frame(&self, width: i32, height: i32) -> bool {
        self.x <= 0 && self.y <= 0 && self.x + self.width >= width && self.y + self.height >= height
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

/// A contour that passed the geometric filters
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Discovery order among all contours of the mask
    pub index: usize,
    pub bbox: BoundingBox,
    /// Contour area in pixels
    pub area: f64,
    /// `area / image_area`
    pub area_ratio: f64,
    /// `min(w, h) / max(w, h)` of the bounding box
    pub aspect_ratio: f64,
    pub vertex_count: usize,
    /// Contour area over convex hull area
    pub solidity: f64,
    /// Filled in by [`ConfidenceScorer`](super::ConfidenceScorer)
    pub confidence: f32,
}

pub struct CandidateExtractor<'a> {
    config: &'a CandidateConfig,
}

impl<'a> CandidateExtractor<'a> {
    pub fn new(config: &'a CandidateConfig) -> Self {
        Self { config }
    }

    /// Collect every plausible card outline in `mask`, in discovery order
    pub fn extract_candidates(&self, mask: &Mat, image_area: f64) -> Result<Vec<Candidate>> {
        if image_area <= 0.0 {
            return Err(CropError::invalid_parameter("image_area", image_area));
        }

        let mut contours = Vector::<VectorOfPoint>::new();
        find_contours(
            mask,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .map_err(|e| CropError::opencv("Contour detection", e))?;

        if contours.is_empty() {
            tracing::warn!("No contours found in foreground mask");
            return Ok(Vec::new());
        }

        let frame = (mask.cols(), mask.rows());
        let mut candidates = Vec::new();
        for (index, contour) in contours.iter().enumerate() {
            if let Some(candidate) = self.evaluate(index, &contour, image_area, frame)? {
                tracing::debug!(
                    index,
                    area_ratio = candidate.area_ratio,
                    aspect = candidate.aspect_ratio,
                    vertices = candidate.vertex_count,
                    solidity = candidate.solidity,
                    "candidate accepted"
                );
                candidates.push(candidate);
            }
        }

        tracing::debug!(
            "{} of {} contours passed the geometric filters",
            candidates.len(),
            contours.len()
        );
        Ok(candidates)
    }

    fn evaluate(
        &self,
        index: usize,
        contour: &VectorOfPoint,
        image_area: f64,
        (frame_width, frame_height): (i32, i32),
    ) -> Result<Option<Candidate>> {
        let cfg = self.config;

        let area = contour_area(contour, false).map_err(|e| CropError::opencv("Area calculation", e))?;
        let area_ratio = area / image_area;
        if area_ratio < cfg.min_area_ratio || area_ratio > cfg.max_area_ratio {
            return Ok(None);
        }

        let rect = bounding_rect(contour).map_err(|e| CropError::opencv("Bounding rect", e))?;
        if rect.width <= 0 || rect.height <= 0 {
            return Ok(None);
        }
        // A mask that filled the whole frame, whatever its exact area ratio
        if BoundingBox::from(rect).spans_frame(frame_width, frame_height) {
            tracing::debug!(index, "contour spans the whole frame, skipped");
            return Ok(None);
        }
        let aspect_ratio = rect.width.min(rect.height) as f64 / rect.width.max(rect.height) as f64;
        if (aspect_ratio - cfg.card_aspect_ratio).abs() > cfg.aspect_ratio_tolerance {
            return Ok(None);
        }

        let perimeter = arc_length(contour, true).map_err(|e| CropError::opencv("Perimeter calculation", e))?;
        let mut approx = VectorOfPoint::new();
        approx_poly_dp(contour, &mut approx, perimeter * cfg.poly_approx_epsilon, true)
            .map_err(|e| CropError::opencv("Polygon approximation", e))?;
        let vertex_count = approx.len();
        if vertex_count < cfg.min_vertices || vertex_count > cfg.max_vertices {
            return Ok(None);
        }

        let mut hull = VectorOfPoint::new();
        convex_hull(contour, &mut hull, false, true).map_err(|e| CropError::opencv("Convex hull", e))?;
        let hull_area = contour_area(&hull, false).map_err(|e| CropError::opencv("Hull area", e))?;
        let solidity = if hull_area > 0.0 {
            (area / hull_area).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Some(Candidate {
            index,
            bbox: rect.into(),
            area,
            area_ratio,
            aspect_ratio,
            vertex_count,
            solidity,
            confidence: 0.0,
        }))
    }
}
