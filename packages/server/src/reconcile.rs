use chrono::Utc;
use common::storage::{BlobKey, BlobStore, Fingerprint};
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entity::file;
use crate::error::AppError;

/// Reconcile an upload into the blob store and the metadata table.
///
/// Writes the blob first, then issues a single conditional upsert: a new
/// `(owner_id, name)` inserts at version 1, an existing one bumps the version
/// by exactly 1 server-side. The ordering means a metadata failure can leave
/// an orphaned blob behind (reported, never rolled back), but metadata never
/// claims bytes that were not durably written.
pub async fn upload<C: ConnectionTrait>(
    db: &C,
    blob_store: &dyn BlobStore,
    owner_id: i32,
    name: &str,
    bytes: &[u8],
) -> Result<file::Model, AppError> {
    let key = BlobKey::new(owner_id, name).map_err(|e| AppError::Validation(e.to_string()))?;
    let digest = Fingerprint::compute(bytes);

    // Blob first. On failure the prior version (if any) remains the durable,
    // consistent state and no metadata statement is issued.
    blob_store
        .put(&key, bytes)
        .await
        .map_err(AppError::storage_write)?;

    let now = Utc::now();
    let model = file::ActiveModel {
        owner_id: Set(key.owner_id()),
        name: Set(key.name().to_string()),
        size: Set(bytes.len() as i64),
        content_hash: Set(digest.to_hex()),
        version: Set(1),
        uploaded_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // Version tracks upload events, not content changes: a byte-identical
    // re-upload still bumps it. The increment is evaluated in the database so
    // concurrent uploads of the same name cannot read-modify-write a stale
    // version.
    file::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([file::Column::OwnerId, file::Column::Name])
                .update_columns([
                    file::Column::ContentHash,
                    file::Column::Size,
                    file::Column::UpdatedAt,
                ])
                .value(
                    file::Column::Version,
                    Expr::col(file::Column::Version).add(1),
                )
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(|e| {
            tracing::warn!(
                blob_key = %key,
                "Metadata write failed after blob write, blob may be orphaned: {e}"
            );
            AppError::MetadataWrite(format!(
                "metadata write failed after blob write (blob at '{key}' may be orphaned): {e}"
            ))
        })?;

    find_record(db, &key)
        .await?
        .ok_or_else(|| AppError::Internal("file row missing after upsert".into()))
}

/// Look up the metadata record for a blob key.
pub async fn find_record<C: ConnectionTrait>(
    db: &C,
    key: &BlobKey,
) -> Result<Option<file::Model>, AppError> {
    file::Entity::find()
        .filter(file::Column::OwnerId.eq(key.owner_id()))
        .filter(file::Column::Name.eq(key.name()))
        .one(db)
        .await
        .map_err(|e| AppError::MetadataRead(e.to_string()))
}
