use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader, StoreStats};

/// Name of the staging directory for in-progress writes.
const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs live in one flat directory, one file per key:
/// `{base_path}/{key}`. Writes are staged under `{base_path}/.tmp/` (or a
/// separate staging directory), synced, and renamed into place so readers
/// never observe a partial file.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating its directories.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        let staging_path = base_path.join(TEMP_DIR);
        Self::with_staging_dir(base_path, staging_path).await
    }

    /// Create a store that stages writes outside its own directory.
    ///
    /// The base directory then holds nothing but blobs. `staging_path` must be
    /// on the same filesystem as `base_path`.
    pub async fn with_staging_dir(
        base_path: PathBuf,
        staging_path: PathBuf,
    ) -> Result<Self, StorageError> {
        let store = Self {
            base_path,
            staging_path,
        };
        store.ensure_dirs().await?;
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute the filesystem path for a given key.
    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.staging_path.join(uuid::Uuid::new_v4().to_string())
    }

    /// Idempotently (re)create the store directories.
    ///
    /// Called on every write so a store directory removed at runtime is
    /// recreated instead of failing the upload.
    async fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path).await?;
        fs::create_dir_all(&self.staging_path).await?;
        Ok(())
    }

    /// Regular, non-hidden files directly under the base path.
    async fn entries(&self) -> Result<Vec<(BlobKey, u64)>, StorageError> {
        let mut dir = match fs::read_dir(&self.base_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Hidden files and names that are not valid keys are never blobs.
            if let Ok(key) = BlobKey::parse(&name) {
                entries.push((key, meta.len()));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, key: &BlobKey, mut reader: BoxReader) -> Result<u64, StorageError> {
        self.ensure_dirs().await?;

        let temp_path = self.temp_path();
        let result = async {
            let mut temp_file = fs::File::create(&temp_path).await?;
            let written = tokio::io::copy(&mut reader, &mut temp_file).await?;
            temp_file.flush().await?;
            temp_file.sync_all().await?;
            drop(temp_file);

            fs::rename(&temp_path, self.blob_path(key)).await?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        match result {
            Ok(written) => Ok(written),
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(e.into())
            }
        }
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(key);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        match fs::metadata(self.blob_path(key)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(key);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobKey>, StorageError> {
        Ok(self.entries().await?.into_iter().map(|(key, _)| key).collect())
    }

    async fn size(&self, key: &BlobKey) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(key);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let root_exists = fs::try_exists(&self.base_path).await?;
        let entries = self.entries().await?;
        Ok(StoreStats {
            root_exists,
            file_count: entries.len() as u64,
            total_bytes: entries.iter().map(|(_, len)| len).sum(),
        })
    }
}
