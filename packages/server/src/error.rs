use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `STORAGE_WRITE_ERROR`, `STORAGE_READ_ERROR`, `METADATA_WRITE_ERROR`,
    /// `METADATA_READ_ERROR`, `METADATA_DELETE_ERROR`, `INCONSISTENT_STATE`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Missing 'file' field")]
    pub message: String,
}

/// Application-level error type.
///
/// Each variant is a distinct, stable failure category so a caller can decide
/// whether to retry, fix its input, or treat the target as absent. None of
/// these are retried internally.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Blob store write failed; metadata was left untouched.
    StorageWrite(String),
    /// Blob store read failed, including the missing-blob (orphan) case.
    StorageRead(String),
    /// Metadata write failed. After a successful blob write this means the
    /// blob at the named key may be orphaned.
    MetadataWrite(String),
    MetadataRead(String),
    MetadataDelete(String),
    /// Blob and metadata disagree (hash or size mismatch), detected at read
    /// time.
    Inconsistency(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::StorageWrite(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "STORAGE_WRITE_ERROR",
                    message: msg,
                },
            ),
            AppError::StorageRead(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "STORAGE_READ_ERROR",
                    message: msg,
                },
            ),
            AppError::MetadataWrite(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "METADATA_WRITE_ERROR",
                    message: msg,
                },
            ),
            AppError::MetadataRead(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "METADATA_READ_ERROR",
                    message: msg,
                },
            ),
            AppError::MetadataDelete(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "METADATA_DELETE_ERROR",
                    message: msg,
                },
            ),
            AppError::Inconsistency(msg) => {
                tracing::warn!("Inconsistent state detected: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INCONSISTENT_STATE",
                        message: msg,
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }

    /// Map a blob-store failure from a write attempt.
    ///
    /// An over-limit payload is the caller's mistake, not an I/O fault.
    pub fn storage_write(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { .. } | StorageError::InvalidKey(_) => {
                AppError::Validation(err.to_string())
            }
            other => AppError::StorageWrite(other.to_string()),
        }
    }

    /// Map a blob-store failure from a read attempt.
    pub fn storage_read(err: StorageError) -> Self {
        AppError::StorageRead(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
