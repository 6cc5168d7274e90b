use std::net::SocketAddr;
use std::path::PathBuf;

use content_store::ContentStoreConfig;

/// Default session lifetime in minutes (24h)
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;
/// Default ceiling on declared and uploaded content size (50 MiB)
pub const DEFAULT_MAX_CONTENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Address for the API HTTP server to listen on
    pub listen_addr: SocketAddr,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// Ciphertext blob storage backend configuration
    pub content_store: ContentStoreConfig,

    // session configuration
    /// Secret used to sign session credentials. Constructed and injected
    /// here so tests can run with isolated secrets; never a global.
    pub session_secret: Vec<u8>,
    /// Session lifetime in minutes
    pub session_ttl_minutes: i64,

    // policy
    /// Accept raw (unwrapped) key material. Demo-only; the secure
    /// default is off.
    pub allow_raw_keys: bool,
    /// Enforce the double-submit request-forgery guard on mutating
    /// calls. Off by default, which is unsafe for production browser
    /// deployments; API-only deployments may leave it off.
    pub require_csrf: bool,
    /// Ceiling on declared and uploaded content size in bytes
    pub max_content_bytes: u64,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// A config suitable for tests: in-memory everything, fixed secret.
    pub fn ephemeral(session_secret: &[u8]) -> Self {
        Self {
            listen_addr: ([127, 0, 0, 1], 0).into(),
            sqlite_path: None,
            content_store: ContentStoreConfig::Memory,
            session_secret: session_secret.to_vec(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            allow_raw_keys: false,
            require_csrf: false,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            log_level: tracing::Level::DEBUG,
            log_dir: None,
        }
    }
}
