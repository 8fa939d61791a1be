//! JSON view of a [`CropResult`] for HTTP transports

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::pipeline::CropResult;
use crate::storage::UploadReceipt;

/// Wire shape returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropResponse {
    pub success: bool,
    /// `data:image/png;base64,...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cropped_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cropped_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_error: Option<String>,
}

impl CropResult {
    pub fn to_response(&self) -> CropResponse {
        let cropped_image = self.image.as_ref().map(|image| {
            format!(
                "data:{};base64,{}",
                image.format.mime_type(),
                base64::engine::general_purpose::STANDARD.encode(&image.bytes)
            )
        });

        CropResponse {
            success: self.success,
            cropped_image,
            confidence: self.confidence,
            message: self.message.clone(),
            error: self.error.clone(),
            original_size: self.original_size.map(|(w, h)| [w, h]),
            cropped_size: self.cropped_size.map(|(w, h)| [w, h]),
            upload: self.upload.clone(),
            upload_error: self.upload_error.clone(),
        }
    }
}

impl CropResponse {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Raw image bytes carried by `cropped_image`, if any
    pub fn decode_image(&self) -> Option<Vec<u8>> {
        let data_uri = self.cropped_image.as_deref()?;
        let (_, payload) = data_uri.split_once(";base64,")?;
        base64::engine::general_purpose::STANDARD.decode(payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CropError;
    use crate::image_loader::ImageFormat;
    use crate::pipeline::EncodedImage;

    #[test]
    fn test_decode_failure_omits_confidence() {
        let error = CropError::ImageDecode {
            message: "Invalid image format".into(),
            source: None,
        };
        let json = CropResult::failure(&error, None).to_response().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Failed to decode image");
        assert_eq!(value["error"], "Invalid image format");
        assert!(value.get("confidence").is_none());
        assert!(value.get("cropped_image").is_none());
    }

    #[test]
    fn test_no_card_keeps_zero_confidence() {
        let error = CropError::NoCandidate { reason: "empty".into() };
        let response = CropResult::failure(&error, Some((640, 480))).to_response();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["confidence"], 0.0);
        assert_eq!(value["original_size"], serde_json::json!([640, 480]));
    }

    #[test]
    fn test_image_becomes_data_uri() {
        let mut result = CropResult::failure(&CropError::NoCandidate { reason: String::new() }, None);
        result.success = true;
        result.image = Some(EncodedImage {
            bytes: vec![137, 80, 78, 71],
            format: ImageFormat::Png,
        });
        result.cropped_size = Some((3, 4));

        let response = result.to_response();
        assert_eq!(response.cropped_image.as_deref(), Some("data:image/png;base64,iVBORw=="));
        assert_eq!(response.decode_image(), Some(vec![137, 80, 78, 71]));
        assert_eq!(response.cropped_size, Some([3, 4]));

        let parsed: CropResponse = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(parsed, response);
    }
}
