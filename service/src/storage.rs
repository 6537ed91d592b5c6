//! Object storage for recording blobs.
//!
//! Objects are addressed by a relative, `/`-separated path such as
//! `k3j9.../1718031234567.webm`. [`FsBucket`] maps that path below a root
//! directory on local disk.

use async_trait::async_trait;
use log::*;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub source: Option<std::io::Error>,
}

#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    /// Empty, absolute, or escaping (`..`) object path
    InvalidPath(String),
    /// The object would replace an existing one
    AlreadyExists(String),
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Storage Error: {:?}", self.kind)
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: StorageErrorKind::Io,
            source: Some(err),
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `path` and returns the stored size. Existing
    /// objects are never overwritten.
    async fn put_object(&self, path: &str, bytes: Vec<u8>) -> Result<u64, StorageError>;
    /// Removes the object at `path`. Removing a missing object succeeds.
    async fn delete_object(&self, path: &str) -> Result<(), StorageError>;
}

/// A bucket backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsBucket {
    root: PathBuf,
}

impl FsBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(StorageError {
                kind: StorageErrorKind::InvalidPath(path.to_string()),
                source: None,
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for FsBucket {
    async fn put_object(&self, path: &str, bytes: Vec<u8>) -> Result<u64, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(&target).await? {
            return Err(StorageError {
                kind: StorageErrorKind::AlreadyExists(path.to_string()),
                source: None,
            });
        }

        let size = bytes.len() as u64;
        tokio::fs::write(&target, bytes).await?;
        debug!("Stored {size} bytes at {}", target.display());

        Ok(size)
    }

    async fn delete_object(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!("Removed {}", target.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_bucket(name: &str) -> FsBucket {
        let root = std::env::temp_dir().join(format!(
            "meeting_hub-storage-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        FsBucket::new(root)
    }

    #[tokio::test]
    async fn put_object_writes_below_the_root() {
        let bucket = scratch_bucket("put");

        let size = bucket
            .put_object("abc/1700000000000.webm", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(size, 3);
        let stored = std::fs::read(bucket.root().join("abc/1700000000000.webm")).unwrap();
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn put_object_refuses_to_overwrite() {
        let bucket = scratch_bucket("overwrite");
        bucket.put_object("abc/1.webm", vec![1]).await.unwrap();

        let err = bucket.put_object("abc/1.webm", vec![2]).await.unwrap_err();

        assert_eq!(
            err.kind,
            StorageErrorKind::AlreadyExists("abc/1.webm".to_string())
        );
    }

    #[tokio::test]
    async fn delete_object_removes_and_tolerates_missing_objects() {
        let bucket = scratch_bucket("delete");
        bucket.put_object("abc/2.webm", vec![7]).await.unwrap();

        bucket.delete_object("abc/2.webm").await.unwrap();
        bucket.delete_object("abc/2.webm").await.unwrap();

        assert!(!bucket.root().join("abc/2.webm").exists());
        assert_eq!(
            bucket.delete_object("../x").await.unwrap_err().kind,
            StorageErrorKind::InvalidPath("../x".to_string())
        );
    }

    #[tokio::test]
    async fn put_object_rejects_paths_outside_the_bucket() {
        let bucket = scratch_bucket("escape");

        for path in ["", "../escape.webm", "/etc/passwd", "abc/../../x"] {
            let err = bucket.put_object(path, vec![0]).await.unwrap_err();
            assert_eq!(err.kind, StorageErrorKind::InvalidPath(path.to_string()));
        }
    }
}
