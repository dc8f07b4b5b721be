use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use common::storage::{BlobKey, Fingerprint};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::instrument;

use crate::entity::file;
use crate::error::{AppError, ErrorBody};
use crate::models::file::{FileListResponse, FileResponse};
use crate::reconcile;
use crate::state::AppState;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024) // 128 MB
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Uploads a file for an owner. The `file` multipart field is required; the \
        part's filename becomes the file name. A first upload creates the record at version 1; \
        re-uploading the same name replaces the content and bumps the version by one.",
    params(("owner_id" = i32, Path, description = "Owner ID")),
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage or metadata failure (STORAGE_WRITE_ERROR, METADATA_WRITE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(owner_id))]
pub async fn upload_file(
    State(state): State<AppState>,
    Path(owner_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file_part: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("File field must have a filename".into())
                    })?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                file_part = Some((file_name, bytes.to_vec()));
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (name, bytes) =
        file_part.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let record = reconcile::upload(&state.db, &*state.blob_store, owner_id, &name, &bytes).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List an owner's files",
    description = "Returns all file records for an owner, most recently uploaded first.",
    params(("owner_id" = i32, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 500, description = "Metadata failure (METADATA_READ_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(owner_id))]
pub async fn list_files(
    State(state): State<AppState>,
    Path(owner_id): Path<i32>,
) -> Result<Json<FileListResponse>, AppError> {
    let records = file::Entity::find()
        .filter(file::Column::OwnerId.eq(owner_id))
        .order_by_desc(file::Column::UploadedAt)
        .order_by_desc(file::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::MetadataRead(e.to_string()))?;

    let total = records.len() as u64;
    let files = records.into_iter().map(FileResponse::from).collect();

    Ok(Json(FileListResponse { files, total }))
}

#[utoipa::path(
    get,
    path = "/{file_id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get a file record",
    params(("file_id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(file_id))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
) -> Result<Json<FileResponse>, AppError> {
    let record = find_file(&state, file_id).await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/{file_id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file's content",
    description = "Returns the stored bytes for a file. The content is re-fingerprinted on the \
        way out and checked against the record, so a blob that went missing or diverged from \
        its metadata is reported instead of served. Supports ETag caching via If-None-Match.",
    params(("file_id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Blob missing or inconsistent (STORAGE_READ_ERROR, INCONSISTENT_STATE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers), fields(file_id))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = find_file(&state, file_id).await?;

    let etag_value = format!("\"{}\"", record.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let key = BlobKey::new(record.owner_id, &record.name)
        .map_err(|e| AppError::Internal(format!("stored name no longer forms a key: {e}")))?;

    let bytes = state.blob_store.get(&key).await.map_err(|e| {
        tracing::warn!(blob_key = %key, "Blob read failed for existing record: {e}");
        AppError::storage_read(e)
    })?;

    // Lazy consistency check: metadata describes what should be at the slot.
    let digest = Fingerprint::compute(&bytes);
    if digest.to_hex() != record.content_hash || bytes.len() as i64 != record.size {
        return Err(AppError::Inconsistency(format!(
            "blob at '{key}' does not match its metadata (expected {} bytes, hash {}; found {} bytes, hash {})",
            record.size,
            record.content_hash,
            bytes.len(),
            digest.to_hex(),
        )));
    }

    let content_type = mime_guess::from_path(&record.name)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.name),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "private, no-cache")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/{file_id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the file record, then deletes the blob best-effort. Record absence \
        is the authoritative signal that the file no longer exists; a failed blob deletion is \
        logged but never fails the request.",
    params(("file_id" = i32, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Metadata failure (METADATA_DELETE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(file_id))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_file(&state, file_id).await?;

    // Record first: its absence is what "deleted" means.
    file::Entity::delete_by_id(record.id)
        .exec(&state.db)
        .await
        .map_err(|e| AppError::MetadataDelete(e.to_string()))?;

    // Best effort.
    match BlobKey::new(record.owner_id, &record.name) {
        Ok(key) => {
            if let Err(e) = state.blob_store.delete(&key).await {
                tracing::warn!(blob_key = %key, "Blob deletion failed after record removal: {e}");
            }
        }
        Err(e) => {
            tracing::warn!("Stored name no longer forms a blob key: {e}");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn find_file(state: &AppState, file_id: i32) -> Result<file::Model, AppError> {
    file::Entity::find_by_id(file_id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::MetadataRead(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
