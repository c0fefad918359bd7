use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::UploadKind;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    /// True when object storage was unavailable and the file is embedded as a `data:` URL
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteUploadRequest {
    pub url: String,
    pub kind: UploadKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteUploadResponse {
    pub deleted: bool,
}

/// Multipart form for the upload endpoints.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
