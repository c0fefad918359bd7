use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::sync::store::{SaveOutcome, SnapshotSource};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub source: SnapshotSource,
    pub is_database_connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    /// Absent when the database is unreachable and nothing was saved
    pub outcome: Option<SaveOutcome>,
}
