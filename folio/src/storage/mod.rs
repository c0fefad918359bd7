//! Uploaded images and documents.
//!
//! Uploads go to an S3-compatible [`ObjectStore`] under one of three buckets, selected by
//! [`UploadKind`]. When object storage is disabled or a put fails, the admin handlers fall back
//! to an inline `data:` URL built by [`to_data_url`] so the upload is never lost.
//!
//! Validation ([`validate_upload`]) runs before any storage call.

pub mod memory;
pub mod s3;

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::{BucketNames, StorageBackendConfig, StorageConfig, UploadLimits},
    errors::Error,
};

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Object storage seam.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create `bucket` if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()>;

    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> anyhow::Result<()>;

    async fn delete(&self, bucket: &str, key: &str) -> anyhow::Result<()>;

    /// URL the object is publicly served from.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    ProfileImage,
    ProjectImage,
    Cv,
}

impl UploadKind {
    pub fn bucket<'a>(&self, buckets: &'a BucketNames) -> &'a str {
        match self {
            UploadKind::ProfileImage => &buckets.profile_images,
            UploadKind::ProjectImage => &buckets.project_images,
            UploadKind::Cv => &buckets.documents,
        }
    }

    /// Key prefix inside the bucket.
    pub fn prefix(&self) -> &'static str {
        match self {
            UploadKind::ProfileImage => "avatars",
            UploadKind::ProjectImage => "projects",
            UploadKind::Cv => "resumes",
        }
    }

    fn is_image(&self) -> bool {
        !matches!(self, UploadKind::Cv)
    }
}

/// Reasons an upload is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    InvalidType(String),
    #[error("{0}")]
    TooLarge(String),
}

impl From<UploadError> for Error {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidType(message) => Error::BadRequest { message },
            UploadError::TooLarge(message) => Error::PayloadTooLarge { message },
        }
    }
}

pub fn validate_upload(kind: UploadKind, content_type: &str, size: u64, limits: &UploadLimits) -> Result<(), UploadError> {
    let content_type = content_type.trim().to_ascii_lowercase();

    let limit = if kind.is_image() {
        if !content_type.starts_with("image/") {
            return Err(UploadError::InvalidType("Please select a valid image file".to_string()));
        }
        limits.max_image_bytes
    } else {
        if content_type != "application/pdf" {
            return Err(UploadError::InvalidType("Please upload a PDF file only".to_string()));
        }
        limits.max_document_bytes
    };

    if size > limit {
        return Err(UploadError::TooLarge(format!(
            "File size must be less than {}MB",
            limit.div_ceil(1024 * 1024)
        )));
    }
    Ok(())
}

/// An uploaded file, as received from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Extension from the file name, else from the MIME type, else `bin`.
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .or_else(|| {
                mime_guess::get_mime_extensions_str(&self.content_type)
                    .and_then(|exts| exts.first())
                    .map(|ext| ext.to_string())
            })
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Inline `data:` URL for `bytes`.
pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Object key for a new upload: `{prefix}/{unix_ms}-{random}.{ext}`.
pub fn object_key(kind: UploadKind, extension: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}/{}-{}.{}", kind.prefix(), Utc::now().timestamp_millis(), &random[..12], extension)
}

/// Object key of a previously returned URL: its last two path segments.
pub fn key_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let file = segments.next()?;
    let folder = segments.next()?;
    Some(format!("{folder}/{file}"))
}

pub struct FileUploads {
    store: Option<Arc<dyn ObjectStore>>,
    buckets: BucketNames,
    cache_control: String,
    limits: UploadLimits,
}

impl FileUploads {
    pub fn new(store: Option<Arc<dyn ObjectStore>>, config: &StorageConfig, limits: UploadLimits) -> Self {
        Self {
            store,
            buckets: config.buckets.clone(),
            cache_control: format!("max-age={}", config.cache_max_age.as_secs()),
            limits,
        }
    }

    /// Build the configured backend.
    pub async fn from_config(config: &StorageConfig, limits: UploadLimits) -> anyhow::Result<Self> {
        let store: Option<Arc<dyn ObjectStore>> = match &config.backend {
            StorageBackendConfig::Disabled => {
                info!("Object storage disabled, uploads will be stored inline");
                None
            }
            StorageBackendConfig::S3 { .. } => Some(Arc::new(S3ObjectStore::from_config(&config.backend).await?)),
        };
        Ok(Self::new(store, config, limits))
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Make sure every bucket exists. Returns false if any could not be created.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> bool {
        let Some(store) = &self.store else {
            return true;
        };

        let mut ok = true;
        for bucket in [&self.buckets.profile_images, &self.buckets.project_images, &self.buckets.documents] {
            if let Err(e) = store.ensure_bucket(bucket).await {
                error!(bucket, error = %e, "Failed to initialise bucket");
                ok = false;
            }
        }
        ok
    }

    /// Store `file` and return its public URL, or `None` when storage is disabled or fails.
    #[instrument(skip(self, file), fields(size = file.size(), content_type = %file.content_type))]
    pub async fn upload(&self, kind: UploadKind, file: &UploadedFile) -> Option<String> {
        let store = self.store.as_ref()?;
        let bucket = kind.bucket(&self.buckets);
        let key = object_key(kind, &file.extension());

        match store
            .put(bucket, &key, file.bytes.clone(), &file.content_type, &self.cache_control)
            .await
        {
            Ok(()) => {
                info!(bucket, key, "Upload stored");
                Some(store.public_url(bucket, &key))
            }
            Err(e) => {
                error!(bucket, key, error = %e, "Upload failed");
                None
            }
        }
    }

    pub async fn upload_profile_image(&self, file: &UploadedFile) -> Option<String> {
        self.upload(UploadKind::ProfileImage, file).await
    }

    pub async fn upload_project_image(&self, file: &UploadedFile) -> Option<String> {
        self.upload(UploadKind::ProjectImage, file).await
    }

    pub async fn upload_cv(&self, file: &UploadedFile) -> Option<String> {
        self.upload(UploadKind::Cv, file).await
    }

    /// Delete the object behind a URL previously returned by [`FileUploads::upload`].
    #[instrument(skip(self))]
    pub async fn delete_file(&self, url: &str, kind: UploadKind) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        if url.starts_with("data:") {
            return false;
        }
        let Some(key) = key_from_url(url) else {
            warn!("Cannot derive object key from URL");
            return false;
        };

        let bucket = kind.bucket(&self.buckets);
        match store.delete(bucket, &key).await {
            Ok(()) => true,
            Err(e) => {
                error!(bucket, key, error = %e, "Delete failed");
                false
            }
        }
    }
}
