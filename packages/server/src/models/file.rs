use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::file;

/// Response DTO for a single file record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    /// File ID, assigned by the metadata store on first upload.
    #[schema(example = 17)]
    pub file_id: i32,
    /// File name, unique per owner.
    #[schema(example = "report.pdf")]
    pub name: String,
    /// Byte length of the current version's content.
    #[schema(example = 142857)]
    pub size: i64,
    /// SHA-256 content hash of the current version.
    #[schema(example = "a1b2c3d4e5f6...")]
    pub content_hash: String,
    /// Upload counter, 1 for a new file, +1 per re-upload.
    #[schema(example = 3)]
    pub version: i32,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response DTO for listing an owner's files.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            file_id: model.id,
            name: model.name,
            size: model.size,
            content_hash: model.content_hash,
            version: model.version,
            uploaded_at: model.uploaded_at,
            updated_at: model.updated_at,
        }
    }
}
