use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One logical file owned by one user.
///
/// `content_hash` and `size` describe the bytes currently expected at the
/// record's blob slot; the upload reconciler keeps them in agreement and the
/// download path verifies it.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "owner_name")]
    pub owner_id: i32,
    /// Flat file name; doubles as the blob address component.
    #[sea_orm(unique_key = "owner_name")]
    pub name: String,

    /// Byte length of the current version's content.
    pub size: i64,
    /// SHA-256 hex digest of the current version's bytes.
    pub content_hash: String,
    /// Starts at 1, +1 on every accepted re-upload.
    pub version: i32,

    pub uploaded_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
