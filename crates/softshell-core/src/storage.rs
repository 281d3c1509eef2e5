//! Key-value storage for persisted preferences.
//!
//! The engine only needs a tiny contract: synchronous reads (values are held
//! in memory), asynchronous writes. [`JsonFileStorage`] is the default
//! implementation, one JSON document on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::BoxFuture;

/// Errors from the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The storage collaborator contract.
///
/// Reads are synchronous and served from memory; writes go to durable
/// storage asynchronously.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set<'a>(&'a self, key: &'a str, value: &'a str)
        -> BoxFuture<'a, Result<(), StorageError>>;

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}

/// File-backed storage: a single JSON object mapping keys to string values.
///
/// The document is read once at open time and kept in memory; every write
/// rewrites the whole file.
pub struct JsonFileStorage {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or initialize) the storage file at `path`.
    ///
    /// A missing file starts empty; a corrupt file is logged and discarded
    /// rather than blocking startup.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(error) => {
                    warn!(path = %path.display(), %error, "corrupt storage file, starting fresh");
                    HashMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn flush(&self, snapshot: HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.data().get(key).cloned()
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let snapshot = {
                let mut data = self.data();
                data.insert(key.to_string(), value.to_string());
                data.clone()
            };
            self.flush(snapshot).await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let snapshot = {
                let mut data = self.data();
                data.remove(key);
                data.clone()
            };
            self.flush(snapshot).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::open(tmp.path().join("prefs.json"))
            .await
            .unwrap();
        assert!(storage.get("anything").is_none());
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::open(tmp.path().join("prefs.json"))
            .await
            .unwrap();
        storage.set("model-preferences", "{}").await.unwrap();
        assert_eq!(storage.get("model-preferences").as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");

        let storage = JsonFileStorage::open(&path).await.unwrap();
        storage.set("key", "value").await.unwrap();
        drop(storage);

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get("key").as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_delete_removes_key() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::open(tmp.path().join("prefs.json"))
            .await
            .unwrap();
        storage.set("key", "value").await.unwrap();
        storage.delete("key").await.unwrap();
        assert!(storage.get("key").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");
        tokio::fs::write(&path, b"not json {{{").await.unwrap();

        let storage = JsonFileStorage::open(&path).await.unwrap();
        assert!(storage.get("key").is_none());
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/prefs.json");
        let storage = JsonFileStorage::open(&path).await.unwrap();
        storage.set("key", "value").await.unwrap();
        assert!(path.exists());
    }
}
