//! Content-addressed blob storage over pluggable object storage backends.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ContentStoreError, Result};

/// Length of a content id in hex characters (SHA-256)
const CONTENT_ID_LEN: usize = 64;

/// A content id: the lowercase hex SHA-256 digest of a blob's bytes
///
/// Deterministic by construction; two blobs with the same bytes always have
/// the same id regardless of who uploaded them or when.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Compute the content id for a byte payload
    pub fn digest(data: &[u8]) -> Self {
        ContentId(hex::encode(Sha256::digest(data)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = ContentStoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != CONTENT_ID_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ContentStoreError::InvalidContentId(s.to_string()));
        }
        Ok(ContentId(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for ContentId {
    type Error = ContentStoreError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

/// Configuration for the content storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Content-addressed blob store.
///
/// `put` computes the id from the bytes and writes under it; writing the
/// same bytes twice lands on the same key and is a no-op overwrite.
#[derive(Debug, Clone)]
pub struct ContentStore {
    inner: Arc<dyn ObjectStore>,
}

impl ContentStore {
    /// Create a new store from configuration.
    pub async fn new(config: ContentStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match &config {
            ContentStoreConfig::Memory => Arc::new(InMemory::new()),

            ContentStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| ContentStoreError::InvalidConfig(e.to_string()))?,
                )
            }

            ContentStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| ContentStoreError::InvalidConfig(e.to_string()))?,
                );

                // Probe the bucket with an empty-prefix list so a missing
                // bucket fails at startup instead of on the first upload
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(ContentStoreError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket")
                                || msg.contains("bucket") && msg.contains("not")
                            {
                                return Err(ContentStoreError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                store
            }
        };

        Ok(Self { inner })
    }

    /// Create an in-memory store.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Build the object path for a blob.
    fn data_path(id: &ContentId) -> ObjectPath {
        ObjectPath::from(format!("data/{}", id))
    }

    /// Store a blob, returning its content id.
    ///
    /// Idempotent: the id is the digest of the bytes, so re-putting the same
    /// payload overwrites it with itself.
    pub async fn put(&self, data: Bytes) -> Result<ContentId> {
        let id = ContentId::digest(&data);
        let path = Self::data_path(&id);
        self.inner.put(&path, data.into()).await?;
        tracing::debug!(content_id = %id, "stored blob");
        Ok(id)
    }

    /// Fetch a blob by content id, or `None` if absent.
    pub async fn get(&self, id: &ContentId) -> Result<Option<Bytes>> {
        let path = Self::data_path(id);
        match self.inner.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a blob exists without fetching it.
    pub async fn has(&self, id: &ContentId) -> Result<bool> {
        let path = Self::data_path(id);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
