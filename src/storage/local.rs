//! Filesystem-backed uploader
//!
//! Objects land under `root/<object_path>`; custom metadata is written to a
//! `<object>.meta.json` sidecar next to the object.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use super::{object_path, resolve_card_id, StorageUploader, UploadReceipt, UploadRequest};
use crate::error::{CropError, Result};

const METADATA_SUFFIX: &str = ".meta.json";

#[derive(Debug, Clone)]
pub struct LocalDirUploader {
    root: PathBuf,
    bucket: String,
}

impl LocalDirUploader {
    /// Store objects below `root`; the bucket name is the directory name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bucket = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "local".to_string());
        Self { root, bucket }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, object_path: &str) -> Result<PathBuf> {
        let relative = Path::new(object_path);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if object_path.is_empty() || escapes {
            return Err(CropError::invalid_parameter("object_path", object_path));
        }
        Ok(self.root.join(relative))
    }

    fn sidecar(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }
}

impl StorageUploader for LocalDirUploader {
    fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt> {
        let card_id = resolve_card_id(request.card_id.as_deref());
        let now = Utc::now();
        let object_path = object_path(&request.filename, request.user_id.as_deref(), &card_id, now);
        let target = self.resolve(&object_path)?;

        tracing::info!(
            "Uploading {} bytes to {}/{}",
            request.bytes.len(),
            self.bucket,
            object_path
        );

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CropError::upload(format!("cannot create {}", parent.display()), e))?;
        }
        fs::write(&target, &request.bytes)
            .map_err(|e| CropError::upload(format!("cannot write {}", target.display()), e))?;

        if !request.metadata.is_empty() {
            let json = serde_json::to_string_pretty(&request.metadata)
                .map_err(|e| CropError::upload("cannot serialize metadata", e))?;
            let sidecar = Self::sidecar(&target);
            fs::write(&sidecar, json)
                .map_err(|e| CropError::upload(format!("cannot write {}", sidecar.display()), e))?;
        }

        let absolute = fs::canonicalize(&target).unwrap_or_else(|_| target.clone());
        Ok(UploadReceipt {
            object_path,
            bucket: self.bucket.clone(),
            public_url: format!("file://{}", absolute.display()),
            signed_url: None,
            size_bytes: request.bytes.len() as u64,
            uploaded_at: now,
            card_id,
        })
    }

    fn delete(&self, object_path: &str) -> Result<bool> {
        let target = self.resolve(object_path)?;
        match fs::remove_file(&target) {
            Ok(()) => {
                let _ = fs::remove_file(Self::sidecar(&target));
                tracing::info!("Deleted {}", object_path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CropError::upload(format!("cannot delete {}", object_path), e)),
        }
    }

    fn check_connection(&self) -> bool {
        match fs::create_dir_all(&self.root) {
            Ok(()) => self.root.is_dir(),
            Err(e) => {
                tracing::error!("Storage root {} unavailable: {}", self.root.display(), e);
                false
            }
        }
    }
}
