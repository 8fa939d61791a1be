//! Storage collaborator for finished crops
//!
//! The pipeline never depends on storage; [`CardCropper::crop_and_store`]
//! hands a successful crop to any [`StorageUploader`] and reports upload
//! failures separately from detection failures.
//!
//! [`CardCropper::crop_and_store`]: crate::CardCropper::crop_and_store

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

pub use local::LocalDirUploader;

/// User folder used when the request names none
pub const DEFAULT_USER_ID: &str = "admin";

/// Hex characters kept from a generated UUID
const CARD_ID_LENGTH: usize = 12;

/// One object to store
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub user_id: Option<String>,
    pub card_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl UploadRequest {
    /// PNG request with default name and no identifiers
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: "card.png".to_string(),
            content_type: "image/png".to_string(),
            user_id: None,
            card_id: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_card_id(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Where and when an object was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// `user/YYYY-MM-DD/cardid_filename`
    pub object_path: String,
    pub bucket: String,
    pub public_url: String,
    /// Time-limited URL, when the backend can sign one
    pub signed_url: Option<String>,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub card_id: String,
}

/// Object store for cropped card images
pub trait StorageUploader: Send + Sync {
    /// Store `request.bytes`
    ///
    /// # Errors
    ///
    /// Returns `CropError::Upload` if the object could not be written.
    fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt>;

    /// Remove an object; `Ok(false)` when it did not exist
    fn delete(&self, object_path: &str) -> Result<bool>;

    /// Whether the backing store is reachable
    fn check_connection(&self) -> bool;
}

/// Card id from the request, or 12 hex chars of a fresh v4 UUID
pub fn resolve_card_id(card_id: Option<&str>) -> String {
    match card_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().simple().to_string()[..CARD_ID_LENGTH].to_string(),
    }
}

/// `user/YYYY-MM-DD/cardid_filename`, dated in UTC
pub fn object_path(filename: &str, user_id: Option<&str>, card_id: &str, now: DateTime<Utc>) -> String {
    let user = user_id.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_USER_ID);
    format!("{}/{}/{}_{}", user, now.format("%Y-%m-%d"), card_id, filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_object_path_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            object_path("card.png", None, "abc123", now),
            "admin/2025-01-15/abc123_card.png"
        );
        assert_eq!(
            object_path("photo.jpg", Some("user42"), "c1", now),
            "user42/2025-01-15/c1_photo.jpg"
        );
    }

    #[test]
    fn test_generated_card_id() {
        let id = resolve_card_id(None);
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, resolve_card_id(None));
        assert_eq!(resolve_card_id(Some("c1")), "c1");
        assert_eq!(resolve_card_id(Some("")).len(), 12);
    }

    #[test]
    fn test_request_builder() {
        let request = UploadRequest::png(vec![1, 2, 3])
            .with_user("u1")
            .with_card_id("c1")
            .with_metadata("confidence", "0.95");
        assert_eq!(request.filename, "card.png");
        assert_eq!(request.content_type, "image/png");
        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert_eq!(request.metadata.get("confidence").map(String::as_str), Some("0.95"));
    }
}
