//! Content-Addressed Ciphertext Storage
//!
//! This crate stores opaque ciphertext blobs addressed by the SHA-256 digest
//! of their bytes, over pluggable object storage (S3/MinIO/local
//! filesystem/memory).
//!
//! # Properties
//!
//! - Content addressing: `put` of the same bytes always yields the same id,
//!   and writing them twice is an idempotent overwrite
//! - The store holds bytes and nothing else: no names, no owners, no
//!   plaintext metadata — all of that lives in the file catalog
//! - Multiple storage backends: S3, local filesystem, in-memory
//!
//! # Example
//!
//! ```rust,no_run
//! use content_store::{ContentStore, ContentStoreConfig};
//!
//! # async fn example() -> Result<(), content_store::ContentStoreError> {
//! let store = ContentStore::new(ContentStoreConfig::Memory).await?;
//!
//! let id = store.put(bytes::Bytes::from_static(b"ciphertext")).await?;
//! let back = store.get(&id).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod store;

pub use error::{ContentStoreError, Result};
pub use store::{ContentId, ContentStore, ContentStoreConfig};
