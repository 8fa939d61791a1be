//! Error types for the slab_crop library

use thiserror::Error;

/// Result type alias for slab_crop operations
pub type Result<T> = std::result::Result<T, CropError>;

/// Error kinds raised by the cropping pipeline and its collaborators
#[derive(Error, Debug)]
pub enum CropError {
    /// Input bytes are not a decodable image
    #[error("Failed to decode image: {message}")]
    ImageDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upload rejected before reaching the pipeline (MIME type, size)
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// Segmentation produced no shape passing the geometric filters
    #[error("No card detected: {reason}")]
    NoCandidate { reason: String },

    /// The winning candidate could not be turned into a valid crop
    #[error("Card extraction failed: {reason}")]
    Extraction { reason: String, confidence: f32 },

    /// PNG encoding of the crop failed
    #[error("Failed to encode image: {message}")]
    Encode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage collaborator failed; never fatal to detection
    #[error("Upload failed: {message}")]
    Upload {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration could not be read, parsed or written
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCv {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },

    /// Caller-imposed deadline elapsed before the pipeline finished
    #[error("Cropping took longer than {limit_ms}ms (gave up after {duration_ms}ms)")]
    Timeout { duration_ms: u64, limit_ms: u64 },
}

impl CropError {
    /// Create a decode error with context
    pub fn decode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageDecode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an encode error with context
    pub fn encode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Encode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upload error with context
    pub fn upload<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upload {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCv {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error indicates a condition the user can fix by retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CropError::NoCandidate { .. } | CropError::Timeout { .. } | CropError::Upload { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            CropError::ImageDecode { .. } => "Failed to decode image".to_string(),
            CropError::InvalidUpload { reason } => reason.clone(),
            CropError::NoCandidate { .. } => {
                "No card detected in image. Please ensure the card is clearly visible against a contrasting background.".to_string()
            }
            CropError::Extraction { .. } => "Failed to extract card from image".to_string(),
            CropError::Upload { .. } => {
                "The card was cropped but could not be uploaded. Please try again.".to_string()
            }
            CropError::Timeout { limit_ms, .. } => {
                format!(
                    "Processing took longer than {:.1}s. Please try a smaller image.",
                    *limit_ms as f64 / 1000.0
                )
            }
            _ => format!("Error processing image: {}", self),
        }
    }
}
