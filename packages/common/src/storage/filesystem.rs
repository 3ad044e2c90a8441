use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;
use tracing::{debug, warn};

use super::error::StorageError;
use super::traits::PhotoStore;
use crate::photo::{self, Photo, PhotoId};

/// Filesystem-backed photo store.
///
/// Photos are stored flat as `{base_path}/{id}.{ext}`. The in-memory index is
/// rebuilt from the directory listing on [`FilesystemPhotoStore::open`], so the
/// directory is the only persistent state.
pub struct FilesystemPhotoStore {
    base_path: PathBuf,
    max_size: u64,
    index: DashMap<PhotoId, Photo>,
}

impl FilesystemPhotoStore {
    /// Open (creating if needed) a store rooted at `base_path`.
    pub async fn open(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        let tmp = base_path.join(".tmp");
        fs::create_dir_all(&tmp).await?;
        clear_dir(&tmp).await?;

        let index = DashMap::new();
        let mut entries = fs::read_dir(&base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            match parse_stored_name(&path) {
                Some((id, extension)) => {
                    let size = entry.metadata().await?.len();
                    index.insert(id, Photo::new(id, path, extension, size));
                }
                None => warn!(path = %path.display(), "Ignoring unrecognized file in photo store"),
            }
        }

        debug!(photos = index.len(), base_path = %base_path.display(), "Photo store opened");

        Ok(Self {
            base_path,
            max_size,
            index,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Number of photos currently indexed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn photo_path(&self, id: &PhotoId, extension: &str) -> PathBuf {
        self.base_path.join(format!("{id}.{extension}"))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn lookup(&self, id: &PhotoId) -> Result<Photo, StorageError> {
        self.index
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::NotFound(*id))
    }
}

/// Parse `{uuid}.{ext}` back into an identifier and accepted extension.
fn parse_stored_name(path: &Path) -> Option<(PhotoId, String)> {
    let name = path.file_name()?.to_str()?;
    let (stem, _) = name.split_once('.')?;
    let id = stem.parse().ok()?;
    let extension = photo::accepted_extension(name).ok()?;
    Some((id, extension))
}

async fn clear_dir(dir: &Path) -> Result<(), StorageError> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let _ = fs::remove_file(entry.path()).await;
    }
    Ok(())
}

#[async_trait]
impl PhotoStore for FilesystemPhotoStore {
    async fn add(&self, data: &[u8], file_name: &str) -> Result<Photo, StorageError> {
        let extension = photo::validate_upload(file_name, data, self.max_size)?;

        let id = PhotoId::new();
        let path = self.photo_path(&id, &extension);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let record = Photo::new(id, path, extension, data.len() as u64);
        self.index.insert(id, record.clone());
        debug!(photo_id = %id, size = record.size, "Photo stored");

        Ok(record)
    }

    async fn get(&self, id: &PhotoId) -> Result<(Vec<u8>, PathBuf), StorageError> {
        let record = self.lookup(id)?;
        match fs::read(&record.path).await {
            Ok(data) => Ok((data, record.path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Removed concurrently.
                Err(StorageError::NotFound(*id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn metadata(&self, id: &PhotoId) -> Result<Photo, StorageError> {
        self.lookup(id)
    }

    async fn remove(&self, id: &PhotoId) -> Result<(), StorageError> {
        let (_, record) = self.index.remove(id).ok_or(StorageError::NotFound(*id))?;

        match fs::remove_file(&record.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(photo_id = %id, "Photo file was already missing on removal");
            }
            Err(e) => {
                self.index.insert(*id, record);
                return Err(e.into());
            }
        }

        debug!(photo_id = %id, "Photo removed");
        Ok(())
    }
}
