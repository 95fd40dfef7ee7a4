// ==========================================
// Dossier Technique - File Storage Collaborator
// ==========================================
// Stores and serves generated binaries. A stored binary may be evicted at
// any time; the engine must always be able to regenerate it from the
// current entry list, so a fetch miss is a recoverable condition.
// ==========================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("stored binary not found: {url}")]
    NotFound { url: String },

    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// External binary storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store a binary under the given file name, returning its URL.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Fetch a previously stored binary by URL.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}

// ==========================================
// LocalFileStorage
// ==========================================
// Filesystem-backed storage under one artifact directory. URLs are
// file:// URLs of the stored path.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_from_url(url: &str) -> Option<PathBuf> {
        url.strip_prefix("file://").map(PathBuf::from)
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(format!("file://{}", path.display()))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = Self::path_from_url(url).ok_or_else(|| StorageError::NotFound {
            url: url.to_string(),
        })?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                url: url.to_string(),
            }),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}
