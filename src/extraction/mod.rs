//! Crop extraction and orientation
//!
//! Turns a detected box into the final upright crop.

pub mod orientation;
pub mod region;

pub use orientation::{LabelScores, OrientationCorrector, Rotation};
pub use region::RegionExtractor;
