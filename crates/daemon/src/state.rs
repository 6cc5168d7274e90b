//! On-disk application state
//!
//! `sealdrop init` creates a config directory (default `~/.sealdrop`)
//! holding `config.toml`, the SQLite record store, and the local ciphertext
//! storage directory. The session signing secret is generated once at init
//! and lives only in that file.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use content_store::ContentStoreConfig;

use crate::service_config::{
    Config as ServiceConfig, DEFAULT_MAX_CONTENT_BYTES, DEFAULT_SESSION_TTL_MINUTES,
};

const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "sealdrop.db";
const STORAGE_DIR: &str = "storage";

/// Contents of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the API server listens on
    pub api_port: u16,
    /// Hex-encoded session signing secret (generated at init)
    pub session_secret: String,
    /// Session lifetime in minutes
    pub session_ttl_minutes: i64,
    /// Accept raw (unwrapped) key material; demo-only
    pub allow_raw_keys: bool,
    /// Enforce the request-forgery guard on mutating calls
    pub require_csrf: bool,
    /// Ceiling on declared and uploaded content size in bytes
    pub max_content_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: 5001,
            session_secret: String::new(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            allow_raw_keys: false,
            require_csrf: false,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }
}

/// Loaded application state: the config plus derived paths
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dir: PathBuf,
    pub db_path: PathBuf,
    pub storage_path: PathBuf,
}

impl AppState {
    /// The default config directory, `~/.sealdrop`
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sealdrop")
    }

    fn paths(dir: &std::path::Path) -> (PathBuf, PathBuf, PathBuf) {
        (
            dir.join(CONFIG_FILE),
            dir.join(DB_FILE),
            dir.join(STORAGE_DIR),
        )
    }

    /// Initialize a fresh config directory with a newly generated secret.
    pub fn init(dir: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = dir.unwrap_or_else(Self::default_dir);
        let (config_path, db_path, storage_path) = Self::paths(&dir);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized(dir));
        }

        std::fs::create_dir_all(&storage_path)?;

        let mut secret = [0u8; 32];
        getrandom::getrandom(&mut secret).expect("failed to generate random bytes");

        let config = AppConfig {
            session_secret: hex::encode(secret),
            ..AppConfig::default()
        };

        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| StateError::InvalidConfig(e.to_string()))?;
        std::fs::write(&config_path, rendered)?;

        Ok(Self {
            config,
            dir,
            db_path,
            storage_path,
        })
    }

    /// Load an existing config directory.
    pub fn load(dir: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = dir.unwrap_or_else(Self::default_dir);
        let (config_path, db_path, storage_path) = Self::paths(&dir);

        if !config_path.exists() {
            return Err(StateError::NotInitialized(dir));
        }

        let raw = std::fs::read_to_string(&config_path)?;
        let config: AppConfig =
            toml::from_str(&raw).map_err(|e| StateError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            dir,
            db_path,
            storage_path,
        })
    }

    /// Assemble the runtime service config from the on-disk state.
    pub fn service_config(
        &self,
        api_port: Option<u16>,
        log_dir: Option<PathBuf>,
    ) -> Result<ServiceConfig, StateError> {
        let secret = hex::decode(&self.config.session_secret)
            .map_err(|_| StateError::InvalidConfig("session_secret is not hex".to_string()))?;
        if secret.is_empty() {
            return Err(StateError::InvalidConfig(
                "session_secret is empty".to_string(),
            ));
        }

        let port = api_port.unwrap_or(self.config.api_port);
        let listen_addr: SocketAddr = ([127, 0, 0, 1], port).into();

        Ok(ServiceConfig {
            listen_addr,
            sqlite_path: Some(self.db_path.clone()),
            content_store: ContentStoreConfig::Local {
                path: self.storage_path.clone(),
            },
            session_secret: secret,
            session_ttl_minutes: self.config.session_ttl_minutes,
            allow_raw_keys: self.config.allow_raw_keys,
            require_csrf: self.config.require_csrf,
            max_content_bytes: self.config.max_content_bytes,
            log_level: tracing::Level::INFO,
            log_dir,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("already initialized at {0}")]
    AlreadyInitialized(PathBuf),
    #[error("not initialized at {0}; run `sealdrop init` first")]
    NotInitialized(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        let initialized = AppState::init(Some(dir.clone())).unwrap();
        assert_eq!(initialized.config.session_secret.len(), 64);
        assert!(!initialized.config.allow_raw_keys);
        assert!(initialized.storage_path.exists());

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(
            loaded.config.session_secret,
            initialized.config.session_secret
        );

        // second init refuses to clobber
        assert!(matches!(
            AppState::init(Some(dir)),
            Err(StateError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_load_uninitialized_fails() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_service_config_parses_secret() {
        let temp = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(temp.path().join("state"))).unwrap();

        let config = state.service_config(Some(7001), None).unwrap();
        assert_eq!(config.listen_addr.port(), 7001);
        assert_eq!(config.session_secret.len(), 32);
        assert!(!config.allow_raw_keys);
    }
}
