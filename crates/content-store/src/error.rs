//! Error types for the content store.

/// Errors that can occur when working with the content store.
#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content id parse error
    #[error("invalid content id: {0}")]
    InvalidContentId(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before starting the service.")]
    BucketNotFound(String),
}

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, ContentStoreError>;
