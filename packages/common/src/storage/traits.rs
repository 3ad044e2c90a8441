use std::path::PathBuf;

use async_trait::async_trait;

use super::error::StorageError;
use crate::photo::{Photo, PhotoId};

/// Storage for uploaded photos, keyed by server-assigned identifier.
///
/// Stored content is immutable: there is no update operation.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Validate and persist an upload, returning the new record.
    async fn add(&self, data: &[u8], file_name: &str) -> Result<Photo, StorageError>;

    /// Read the stored bytes and their location.
    async fn get(&self, id: &PhotoId) -> Result<(Vec<u8>, PathBuf), StorageError>;

    /// Look up a record without reading its content.
    async fn metadata(&self, id: &PhotoId) -> Result<Photo, StorageError>;

    /// Delete the content and its record.
    ///
    /// Fails with `NotFound` when nothing is stored under `id`, including
    /// repeated deletes.
    async fn remove(&self, id: &PhotoId) -> Result<(), StorageError>;
}
