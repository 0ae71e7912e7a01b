//! Blob storage for uploaded files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque store keyed by generated names
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Directory served under `/static`, when the store is file-backed
    fn public_dir(&self) -> Option<&Path>;
}

/// Stores blobs as files in one directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Creates the directory if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        let path = self.root.join(name);
        tokio::fs::write(&path, data).await?;
        debug!("Stored blob {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    fn public_dir(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// `<uuid><ext>` where `ext` is the original extension, if any.
pub fn generated_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}{}", uuid::Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_name_keeps_extension() {
        let name = generated_name("avatar.png");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 36 + 4);

        let bare = generated_name("README");
        assert_eq!(bare.len(), 36);

        let odd = generated_name("x.p/ng");
        assert!(!odd.contains('/'));
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = std::env::temp_dir().join(format!("workprofit-blobs-{}", uuid::Uuid::new_v4()));
        let store = LocalBlobStore::new(&dir).unwrap();

        store.put("hello.txt", b"hi").await.unwrap();
        assert_eq!(std::fs::read(dir.join("hello.txt")).unwrap(), b"hi");

        assert!(store.put("../escape.txt", b"x").await.is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
