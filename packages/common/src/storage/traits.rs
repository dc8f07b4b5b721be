use async_trait::async_trait;

use super::error::StorageError;
use super::key::BlobKey;

/// Name-addressed blob storage: one durable byte slot per [`BlobKey`].
///
/// A `put` to an occupied key overwrites the previous content in one atomic
/// step; readers never observe a torn write. Individual operations are
/// serialized by the backing store, but sequences of operations are not.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the payload at the given key, replacing any prior content.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve the full contents of the blob at the given key.
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError>;

    /// Check whether a blob exists at the given key.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete the blob at the given key.
    ///
    /// Returns `true` if a blob was deleted, `false` if the slot was empty.
    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Get the size of the blob at the given key in bytes.
    async fn size(&self, key: &BlobKey) -> Result<u64, StorageError>;
}
