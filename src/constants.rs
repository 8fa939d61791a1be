//! Default thresholds for card detection
//!
//! These are the tuned values behind [`CropConfig::default`](crate::CropConfig).
//! Hue values use OpenCV's 8-bit HSV convention (hue in `0..=180`).

/// Standard trading card geometry
pub mod card {
    /// Short side over long side of a 2.5" x 3.5" card
    pub const CARD_ASPECT_RATIO: f64 = 2.5 / 3.5;

    /// Maximum allowed deviation from [`CARD_ASPECT_RATIO`]
    pub const ASPECT_RATIO_TOLERANCE: f64 = 0.30;

    /// Candidate must cover at least 5% of the image
    pub const MIN_CARD_AREA_RATIO: f64 = 0.05;

    /// Contours hugging the whole frame are mask artifacts, not cards
    pub const MAX_CARD_AREA_RATIO: f64 = 0.99;

    /// Vertex bounds after polygon approximation
    pub const MIN_VERTICES: usize = 4;
    pub const MAX_VERTICES: usize = 12;

    /// Polygon approximation epsilon as fraction of perimeter
    pub const POLY_APPROX_EPSILON: f64 = 0.02;
}

/// Segmentation parameters
pub mod segmentation {
    /// Gaussian blur kernel applied to the grayscale image
    pub const BLUR_KERNEL_SIZE: i32 = 5;

    /// Mean luminance below which the scene counts as a dark backdrop
    pub const DARK_MEAN_LUMINANCE: f64 = 100.0;

    /// Bright-foreground threshold on dark backdrops
    pub const DARK_FOREGROUND_THRESHOLD: f64 = 40.0;
    pub const DARK_CANNY_LOW: f64 = 50.0;
    pub const DARK_CANNY_HIGH: f64 = 150.0;

    pub const LIGHT_CANNY_LOW: f64 = 30.0;
    pub const LIGHT_CANNY_HIGH: f64 = 100.0;
    pub const ADAPTIVE_BLOCK_SIZE: i32 = 11;
    pub const ADAPTIVE_BIAS: f64 = 2.0;

    /// Pixels darker than this are kept on light backdrops (cast shadows)
    pub const SHADOW_THRESHOLD: f64 = 200.0;

    pub const MORPH_KERNEL_SIZE: i32 = 5;
    pub const CLOSE_ITERATIONS: i32 = 2;
    pub const OPEN_ITERATIONS: i32 = 1;

    /// Wood strategy
    pub const WOOD_MORPH_KERNEL_SIZE: i32 = 7;
    pub const WOOD_CANNY_LOW: f64 = 30.0;
    pub const WOOD_CANNY_HIGH: f64 = 100.0;
    pub const WOOD_EXCLUDE_HUE: (f64, f64) = (8.0, 35.0);
    pub const WOOD_EXCLUDE_SATURATION: (f64, f64) = (30.0, 220.0);
    pub const WOOD_EXCLUDE_VALUE: (f64, f64) = (30.0, 200.0);
    /// Plastic reflections on slabs
    pub const BRIGHT_THRESHOLD: f64 = 200.0;
    pub const BLUE_HUE: (f64, f64) = (90.0, 130.0);
    pub const BLUE_SATURATION: (f64, f64) = (50.0, 255.0);
    pub const BLUE_VALUE: (f64, f64) = (50.0, 255.0);
}

/// Scene classification parameters
pub mod scene {
    /// Status bar: top strip height fraction, spread ceiling, mean floor
    pub const STATUS_BAR_HEIGHT: f64 = 0.05;
    pub const STATUS_BAR_MAX_SPREAD: f64 = 40.0;
    pub const STATUS_BAR_MIN_MEAN: f64 = 20.0;

    /// UI icon: top-left corner size and edge density
    pub const CORNER_HEIGHT: f64 = 0.08;
    pub const CORNER_WIDTH: f64 = 0.15;
    pub const CORNER_MIN_EDGE_DENSITY: f64 = 0.02;
    pub const CORNER_CANNY_LOW: f64 = 50.0;
    pub const CORNER_CANNY_HIGH: f64 = 150.0;

    /// On-screen text: top-center strip
    pub const TEXT_STRIP_HEIGHT: f64 = 0.08;
    pub const TEXT_STRIP_WIDTH: f64 = 0.40;
    pub const TEXT_STRIP_MIN_SPREAD: f64 = 30.0;

    /// Wood grain colors
    pub const WOOD_HUE: (f64, f64) = (10.0, 30.0);
    pub const WOOD_SATURATION: (f64, f64) = (30.0, 200.0);
    pub const WOOD_VALUE: (f64, f64) = (30.0, 180.0);
    pub const WOOD_MIN_FRACTION: f64 = 0.15;
}

/// Scoring weights; they sum to 1.0
pub mod scoring {
    pub const ASPECT_WEIGHT: f64 = 0.40;
    pub const AREA_WEIGHT: f64 = 0.30;
    pub const VERTEX_WEIGHT: f64 = 0.20;
    pub const SOLIDITY_WEIGHT: f64 = 0.10;
}

/// Crop and orientation parameters
pub mod extraction {
    /// Inset applied to each side of non-screenshot crops
    pub const MARGIN_INSET_PERCENT: f64 = 0.02;

    /// Width of the left/right strips inspected for a slab label
    pub const LABEL_STRIP_FRACTION: f64 = 0.12;

    /// Modern red label border, both ends of the hue wheel
    pub const RED_LOW_HUE: (f64, f64) = (0.0, 10.0);
    pub const RED_HIGH_HUE: (f64, f64) = (160.0, 180.0);
    pub const RED_SATURATION: (f64, f64) = (100.0, 255.0);
    pub const RED_VALUE: (f64, f64) = (100.0, 255.0);

    /// Legacy navy label
    pub const NAVY_HUE: (f64, f64) = (105.0, 125.0);
    pub const NAVY_SATURATION: (f64, f64) = (50.0, 200.0);
    pub const NAVY_VALUE: (f64, f64) = (20.0, 150.0);
    pub const NAVY_WEIGHT: f64 = 1.5;
}

/// Service limits owned by the transport layer
pub mod service {
    use std::time::Duration;

    pub const MAX_IMAGE_SIZE_MB: u64 = 10;
    pub const CROP_TIMEOUT: Duration = Duration::from_secs(3);
}
