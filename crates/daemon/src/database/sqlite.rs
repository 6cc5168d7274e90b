use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::DatabaseSetupError;

/// Everything lives in three tables: pending login challenges, file
/// records, and the access tokens that reference them. Token rows are
/// never deleted; revocation is a one-way flag.
const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS challenges (
    context_id TEXT PRIMARY KEY,
    nonce      TEXT NOT NULL,
    issued_at  TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    id            TEXT PRIMARY KEY,
    owner_address TEXT NOT NULL,
    title         TEXT,
    description   TEXT,
    cid           TEXT NOT NULL,
    name          TEXT,
    mime          TEXT,
    size_bytes    INTEGER,
    iv            BLOB NOT NULL,
    salt          BLOB,
    wrap_iv       BLOB,
    wrapped_key   BLOB,
    raw_key       BLOB,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_owner ON files (owner_address, created_at);

CREATE TABLE IF NOT EXISTS tokens (
    token             TEXT PRIMARY KEY,
    file_id           TEXT NOT NULL REFERENCES files (id),
    issued_to_address TEXT,
    expires_at        TEXT NOT NULL,
    revoked           INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tokens_file ON tokens (file_id);
"#;

pub(super) async fn connect_sqlite(url: &url::Url) -> Result<SqlitePool, DatabaseSetupError> {
    let options = SqliteConnectOptions::from_str(url.as_str())
        .map_err(DatabaseSetupError::Unavailable)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection; cap the pool at one so
    // every query sees the same database.
    let pool_options = if url.as_str().contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(DatabaseSetupError::Unavailable)
}

pub(super) async fn migrate_sqlite(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
    sqlx::raw_sql(MIGRATIONS)
        .execute(pool)
        .await
        .map_err(DatabaseSetupError::MigrationFailed)?;
    Ok(())
}
