use sqlx::Row;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use super::file_queries::OWNER_LIST_LIMIT;
use super::Database;

/// A new access token, ready for insertion
#[derive(Debug, Clone)]
pub struct NewToken {
    pub token: String,
    pub file_id: Uuid,
    pub issued_to_address: Option<String>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Everything a redeemer needs, joined through the file record
///
/// Lifecycle state (`revoked`, `expires_at`) is returned raw; the caller
/// decides which typed failure to report.
#[derive(Debug, Clone)]
pub struct RedemptionRow {
    pub file_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub revoked: bool,
    pub cid: String,
    pub iv: Vec<u8>,
    pub salt: Option<Vec<u8>>,
    pub wrap_iv: Option<Vec<u8>>,
    pub wrapped_key: Option<Vec<u8>>,
    pub raw_key: Option<Vec<u8>>,
    pub name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
}

/// Token info for owner dashboards
#[derive(Debug, Clone)]
pub struct TokenSummary {
    pub token: String,
    pub file_id: Uuid,
    pub revoked: bool,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub title: Option<String>,
    pub name: Option<String>,
    pub size_bytes: Option<i64>,
}

impl Database {
    /// Insert a new access token for an existing file record.
    pub async fn insert_token(&self, token: &NewToken) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tokens (token, file_id, issued_to_address, expires_at, revoked, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(&token.token)
        .bind(token.file_id.to_string())
        .bind(&token.issued_to_address)
        .bind(
            token
                .expires_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
        )
        .bind(
            token
                .created_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
        )
        .execute(&**self)
        .await?;

        Ok(())
    }

    /// Look up a token and its file record for redemption.
    pub async fn get_redemption(&self, token: &str) -> Result<Option<RedemptionRow>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT t.file_id, t.expires_at, t.revoked,
                   f.cid, f.iv, f.salt, f.wrap_iv, f.wrapped_key, f.raw_key,
                   f.name, f.mime, f.size_bytes
            FROM tokens t
            JOIN files f ON f.id = t.file_id
            WHERE t.token = ?1
            "#,
        )
        .bind(token)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(|r| RedemptionRow {
            file_id: Uuid::parse_str(&r.get::<String, _>("file_id"))
                .expect("invalid file id UUID in database"),
            expires_at: OffsetDateTime::parse(&r.get::<String, _>("expires_at"), &Rfc3339)
                .expect("invalid timestamp in database"),
            revoked: r.get("revoked"),
            cid: r.get("cid"),
            iv: r.get("iv"),
            salt: r.get("salt"),
            wrap_iv: r.get("wrap_iv"),
            wrapped_key: r.get("wrapped_key"),
            raw_key: r.get("raw_key"),
            name: r.get("name"),
            mime: r.get("mime"),
            size_bytes: r.get("size_bytes"),
        }))
    }

    /// Revoke a token, authorized through the owning file record.
    ///
    /// Returns `false` when the token does not exist or belongs to someone
    /// else's file; callers report both as not-found. Revoking an
    /// already-revoked token succeeds (one-way flag, idempotent).
    pub async fn revoke_token(&self, token: &str, owner: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tokens SET revoked = 1
            WHERE token = ?1
              AND file_id IN (SELECT id FROM files WHERE owner_address = ?2)
            "#,
        )
        .bind(token)
        .bind(owner)
        .execute(&**self)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List an owner's tokens with file display info, newest first, capped.
    pub async fn list_tokens_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<TokenSummary>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT t.token, t.file_id, t.revoked, t.expires_at, t.created_at,
                   f.title, f.name, f.size_bytes
            FROM tokens t
            JOIN files f ON f.id = t.file_id
            WHERE f.owner_address = ?1
            ORDER BY t.created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(owner)
        .bind(OWNER_LIST_LIMIT)
        .fetch_all(&**self)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TokenSummary {
                token: r.get("token"),
                file_id: Uuid::parse_str(&r.get::<String, _>("file_id"))
                    .expect("invalid file id UUID in database"),
                revoked: r.get("revoked"),
                expires_at: OffsetDateTime::parse(&r.get::<String, _>("expires_at"), &Rfc3339)
                    .expect("invalid timestamp in database"),
                created_at: OffsetDateTime::parse(&r.get::<String, _>("created_at"), &Rfc3339)
                    .expect("invalid timestamp in database"),
                title: r.get("title"),
                name: r.get("name"),
                size_bytes: r.get("size_bytes"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::file_queries::NewFileRecord;
    use super::*;

    use common::crypto::{Iv, KeyMaterial};

    async fn test_db() -> Database {
        let url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&url).await.unwrap()
    }

    async fn seed_file(db: &Database, owner: &str) -> (Uuid, String) {
        let file = NewFileRecord {
            id: Uuid::new_v4(),
            owner_address: owner.to_string(),
            title: Some("notes".to_string()),
            description: None,
            cid: "cd".repeat(32),
            name: Some("notes.txt".to_string()),
            mime: Some("text/plain".to_string()),
            size_bytes: Some(64),
            iv: Iv::generate(),
            key_material: KeyMaterial::from_parts(None, None, None, Some(vec![1u8; 32])).unwrap(),
            created_at: OffsetDateTime::now_utc(),
        };
        let token = NewToken {
            token: Uuid::new_v4().to_string(),
            file_id: file.id,
            issued_to_address: None,
            expires_at: OffsetDateTime::now_utc() + time::Duration::hours(24),
            created_at: OffsetDateTime::now_utc(),
        };
        db.insert_file_with_token(&file, &token).await.unwrap();
        (file.id, token.token)
    }

    #[tokio::test]
    async fn test_redemption_joins_file_fields() {
        let db = test_db().await;
        let (file_id, token) = seed_file(&db, "0xAAA").await;

        let row = db.get_redemption(&token).await.unwrap().unwrap();
        assert_eq!(row.file_id, file_id);
        assert_eq!(row.name.as_deref(), Some("notes.txt"));
        assert!(!row.revoked);
        assert!(row.raw_key.is_some());
        assert!(row.salt.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let db = test_db().await;
        assert!(db.get_redemption("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_requires_ownership() {
        let db = test_db().await;
        let (_, token) = seed_file(&db, "0xAAA").await;

        // wrong owner: no-op, token stays valid
        assert!(!db.revoke_token(&token, "0xBBB").await.unwrap());
        assert!(!db.get_redemption(&token).await.unwrap().unwrap().revoked);

        // right owner: revoked, and revoking again still succeeds
        assert!(db.revoke_token(&token, "0xAAA").await.unwrap());
        assert!(db.revoke_token(&token, "0xAAA").await.unwrap());
        assert!(db.get_redemption(&token).await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn test_list_tokens_by_owner() {
        let db = test_db().await;
        let (file_id, _) = seed_file(&db, "0xAAA").await;
        seed_file(&db, "0xBBB").await;

        let extra = NewToken {
            token: Uuid::new_v4().to_string(),
            file_id,
            issued_to_address: Some("0xCCC".to_string()),
            expires_at: OffsetDateTime::now_utc() + time::Duration::minutes(5),
            created_at: OffsetDateTime::now_utc(),
        };
        db.insert_token(&extra).await.unwrap();

        let listed = db.list_tokens_by_owner("0xAAA").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|t| t.file_id == file_id));
    }
}
