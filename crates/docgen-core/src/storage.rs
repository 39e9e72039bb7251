//! Object storage
//!
//! Opaque byte blobs keyed by name, with a content type and string
//! metadata per object. Two backends:
//! - [`MemoryStore`]: concurrent in-process map, for tests and embedding
//! - [`FsStore`]: one file per object plus a `<key>.meta.json` sidecar

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Content type used when the caller gives none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const META_SUFFIX: &str = ".meta.json";

/// Options for a put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PutOptions {
    /// Options with a content type
    #[must_use]
    pub fn content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// With one metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Stored object metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub key: String,
    pub content_type: String,
    pub size: u64,
    pub metadata: BTreeMap<String, String>,
    pub last_modified: DateTime<Utc>,
}

impl ObjectMeta {
    fn new(key: &str, size: usize, options: PutOptions) -> Self {
        Self {
            key: key.to_string(),
            content_type: options
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: size as u64,
            metadata: options.metadata,
            last_modified: Utc::now(),
        }
    }
}

/// Object storage backend
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store `content` under `key`, replacing any existing object
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectMeta, StorageError>;

    /// Fetch an object's content
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Fetch an object's metadata
    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError>;
}

/// Keys are flat names: no separators, no parent references, and never
/// colliding with a metadata sidecar.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.contains(['/', '\\'])
        || key.starts_with('.')
        || key.ends_with(META_SUFFIX)
        || key.chars().any(char::is_control);
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, (Vec<u8>, ObjectMeta)>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sorted keys of every stored object
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectMeta, StorageError> {
        validate_key(key)?;
        let meta = ObjectMeta::new(key, content.len(), options);
        self.objects
            .insert(key.to_string(), (content, meta.clone()));
        Ok(meta)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        Ok(self.objects.get(key).map(|entry| entry.0.clone()))
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError> {
        validate_key(key)?;
        Ok(self.objects.get(key).map(|entry| entry.1.clone()))
    }
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Store objects under `root` (created on first put)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{META_SUFFIX}"))
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectMeta, StorageError> {
        validate_key(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io_error(key, e))?;

        let meta = ObjectMeta::new(key, content.len(), options);
        let meta_json = serde_json::to_vec_pretty(&meta).map_err(|e| StorageError::Metadata {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        tokio::fs::write(self.object_path(key), content)
            .await
            .map_err(|e| StorageError::io_error(key, e))?;
        tokio::fs::write(self.meta_path(key), meta_json)
            .await
            .map_err(|e| StorageError::io_error(key, e))?;
        tracing::debug!(key, size = meta.size, "stored object");
        Ok(meta)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        match tokio::fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io_error(key, e)),
        }
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError> {
        validate_key(key)?;
        let bytes = match tokio::fs::read(self.meta_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io_error(key, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Metadata {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}
