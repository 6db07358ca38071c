//! Durable response store.
//!
//! # Responsibilities
//! - Answer whether a capture exists for a key
//! - Read a capture back, surfacing corruption as an error
//! - Persist a capture so readers never observe a partial file
//!
//! # Design Decisions
//! - One JSON file per key under a single directory
//! - Writes go to a uniquely named temp file in the same directory, then rename
//! - No locking: distinct keys touch distinct files, same-key writers race and
//!   the last rename wins

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::capture::key::CacheKey;
use crate::capture::record::{CaptureFile, CapturedResponse, InvalidCapture};

/// Errors raised by store reads and writes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entry could not be read from disk.
    #[error("failed to read capture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry exists but is not valid JSON.
    #[error("capture {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The entry parsed but does not describe a response.
    #[error("capture {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: InvalidCapture,
    },

    /// The entry could not be written.
    #[error("failed to write capture {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The capture could not be serialized.
    #[error("failed to encode capture: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value storage for captured responses.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// True iff a capture is present for `key`.
    async fn exists(&self, key: &CacheKey) -> bool;

    /// Load the capture stored under `key`.
    async fn read(&self, key: &CacheKey) -> Result<CapturedResponse, StoreError>;

    /// Store `response` under `key`, replacing any previous capture.
    async fn write(&self, key: &CacheKey, response: &CapturedResponse) -> Result<(), StoreError>;
}

/// Store backed by a directory of `<key>.json` files.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `directory`. Nothing is touched on disk.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Create the backing directory if it does not exist yet.
    pub async fn init(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tracing::info!(directory = %self.directory.display(), "Capture store ready");
        Ok(())
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.file_name())
    }
}

#[async_trait]
impl ResponseStore for FileStore {
    async fn exists(&self, key: &CacheKey) -> bool {
        tokio::fs::metadata(self.path_for(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, key: &CacheKey) -> Result<CapturedResponse, StoreError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        let file: CaptureFile = match serde_json::from_slice(&raw) {
            Ok(file) => file,
            Err(source) => return Err(StoreError::Malformed { path, source }),
        };
        CapturedResponse::try_from(file).map_err(|source| StoreError::Invalid { path, source })
    }

    async fn write(&self, key: &CacheKey, response: &CapturedResponse) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let contents = serde_json::to_vec_pretty(&CaptureFile::from(response))?;

        // Same directory as the target so the rename never crosses filesystems.
        let tmp_path = self.directory.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(source) = tokio::fs::write(&tmp_path, &contents).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Write { path, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Write { path, source });
        }

        tracing::debug!(key = %key, bytes = contents.len(), "Capture written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample(status: StatusCode, body: &'static str) -> CapturedResponse {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".into(), "application/json".into());
        headers.insert("x-upstream".into(), "catalog".into());
        CapturedResponse {
            status,
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn missing_entry_does_not_exist() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(!store.exists(&CacheKey::derive("/nothing")).await);
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = CacheKey::derive("/products/7?currency=eur");
        let response = sample(StatusCode::CREATED, r#"{"id":7}"#);

        store.write(&key, &response).await.unwrap();

        assert!(store.exists(&key).await);
        assert_eq!(store.read(&key).await.unwrap(), response);
        assert!(dir.path().join("__products__7?currency=eur.json").is_file());
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_capture() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = CacheKey::derive("/status");

        store.write(&key, &sample(StatusCode::OK, "first")).await.unwrap();
        store.write(&key, &sample(StatusCode::ACCEPTED, "second")).await.unwrap();

        let read = store.read(&key).await.unwrap();
        assert_eq!(read.status, StatusCode::ACCEPTED);
        assert_eq!(read.body, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store
            .write(&CacheKey::derive("/a"), &sample(StatusCode::OK, "{}"))
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["__a.json".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = CacheKey::derive("/broken");
        std::fs::write(store.path_for(&key), b"{\"status\": 200, \"hea").unwrap();

        assert!(store.exists(&key).await);
        let err = store.read(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn removed_entry_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.read(&CacheKey::derive("/gone")).await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        let err = store
            .write(&CacheKey::derive("/x"), &sample(StatusCode::OK, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("cache"));
        store.init().await.unwrap();
        store.init().await.unwrap();
        assert!(dir.path().join("cache").is_dir());
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_key_leave_one_whole_capture() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = CacheKey::derive("/race");
        let first = sample(StatusCode::OK, r#"{"writer":"first"}"#);
        let second = sample(StatusCode::ACCEPTED, r#"{"writer":"second"}"#);

        let (a, b) = tokio::join!(store.write(&key, &first), store.write(&key, &second));
        a.unwrap();
        b.unwrap();

        let stored = store.read(&key).await.unwrap();
        assert!(stored == first || stored == second);
        assert_eq!(
            std::fs::read_dir(dir.path()).unwrap().count(),
            1,
            "only the capture file remains"
        );
    }
}
