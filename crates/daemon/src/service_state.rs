use content_store::ContentStore;
use url::Url;

use crate::database::{Database, DatabaseSetupError};
use crate::service_config::Config;
use crate::session::Sessions;

/// Request-handling policy knobs, copied off the config at startup
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub allow_raw_keys: bool,
    pub require_csrf: bool,
    pub max_content_bytes: u64,
}

/// Main service state - orchestrates all components
#[derive(Clone)]
pub struct State {
    database: Database,
    store: ContentStore,
    sessions: Sessions,
    policy: Policy,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => Url::parse(&format!("sqlite://{}", path.display()))
                .map_err(|_| StateSetupError::InvalidDatabaseUrl),
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!(url = %sqlite_database_url, "connecting record store");
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup ciphertext store
        let store = ContentStore::new(config.content_store.clone())
            .await
            .map_err(|e| StateSetupError::ContentStoreError(e.to_string()))?;

        // 3. Session issuing, with the injected signing secret
        let sessions = Sessions::new(&config.session_secret, config.session_ttl_minutes);

        let policy = Policy {
            allow_raw_keys: config.allow_raw_keys,
            require_csrf: config.require_csrf,
            max_content_bytes: config.max_content_bytes,
        };

        if policy.allow_raw_keys {
            tracing::warn!("raw key material is enabled; do not run this in production");
        }
        if !policy.require_csrf {
            tracing::warn!("request-forgery guard is disabled (permissive default)");
        }

        Ok(Self {
            database,
            store,
            sessions,
            policy,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Content store error: {0}")]
    ContentStoreError(String),
}
