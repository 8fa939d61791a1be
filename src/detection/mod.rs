//! Card and slab detection module
//!
//! This module handles the computer vision side of the pipeline: classifying
//! the background, building a foreground mask, and picking the contour most
//! likely to be a card.

pub mod candidate;
pub mod card;
pub(crate) mod ops;
pub mod scene;
pub mod scoring;
pub mod segmentation;

pub use candidate::{BoundingBox, Candidate, CandidateExtractor};
pub use card::{CardDetector, DetectionResult};
pub use scene::{SceneAnalysis, SceneClassifier, SceneKind};
pub use scoring::ConfidenceScorer;
pub use segmentation::Segmenter;
