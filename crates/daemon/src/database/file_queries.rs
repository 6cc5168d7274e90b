use sqlx::Row;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use common::crypto::{Iv, KeyMaterial};

use super::token_queries::NewToken;
use super::Database;

/// Cap on owner-scoped listings, to bound response size
pub(crate) const OWNER_LIST_LIMIT: i64 = 500;

/// A fully validated file record, ready for insertion
///
/// Construction happens at the API boundary; by the time a value of this
/// type exists, sizes and the key-material union have been checked.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub owner_address: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cid: String,
    pub name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub iv: Iv,
    pub key_material: KeyMaterial,
    pub created_at: OffsetDateTime,
}

/// File info for owner dashboards
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub name: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: OffsetDateTime,
}

impl Database {
    /// Insert a file record together with its first access token.
    ///
    /// One transaction: a record with no token would be unreachable, so if
    /// the token insert fails the record must not survive either.
    pub async fn insert_file_with_token(
        &self,
        file: &NewFileRecord,
        token: &NewToken,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO files
                (id, owner_address, title, description, cid, name, mime,
                 size_bytes, iv, salt, wrap_iv, wrapped_key, raw_key, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(file.id.to_string())
        .bind(&file.owner_address)
        .bind(&file.title)
        .bind(&file.description)
        .bind(&file.cid)
        .bind(&file.name)
        .bind(&file.mime)
        .bind(file.size_bytes)
        .bind(file.iv.bytes().to_vec())
        .bind(file.key_material.salt().map(|s| s.bytes().to_vec()))
        .bind(file.key_material.wrap_iv().map(|iv| iv.bytes().to_vec()))
        .bind(file.key_material.wrapped_key().map(|k| k.to_vec()))
        .bind(file.key_material.raw_key().map(|k| k.bytes().to_vec()))
        .bind(
            file.created_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
        )
        .execute(&mut *tx)
        .await?;

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
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Whether a file exists and belongs to the given owner.
    ///
    /// Callers report `false` as not-found without distinguishing
    /// "exists but not yours".
    pub async fn file_exists_owned(&self, id: &Uuid, owner: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM files WHERE id = ?1 AND owner_address = ?2")
            .bind(id.to_string())
            .bind(owner)
            .fetch_optional(&**self)
            .await?;

        Ok(row.is_some())
    }

    /// List an owner's file records, newest first, capped.
    pub async fn list_files_by_owner(&self, owner: &str) -> Result<Vec<FileSummary>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, name, size_bytes, created_at
            FROM files
            WHERE owner_address = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(owner)
        .bind(OWNER_LIST_LIMIT)
        .fetch_all(&**self)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FileSummary {
                id: Uuid::parse_str(&r.get::<String, _>("id"))
                    .expect("invalid file id UUID in database"),
                title: r.get("title"),
                name: r.get("name"),
                size_bytes: r.get("size_bytes"),
                created_at: OffsetDateTime::parse(&r.get::<String, _>("created_at"), &Rfc3339)
                    .expect("invalid timestamp in database"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&url).await.unwrap()
    }

    fn sample_file(owner: &str) -> NewFileRecord {
        NewFileRecord {
            id: Uuid::new_v4(),
            owner_address: owner.to_string(),
            title: Some("report".to_string()),
            description: None,
            cid: "ab".repeat(32),
            name: Some("report.pdf".to_string()),
            mime: Some("application/pdf".to_string()),
            size_bytes: Some(1024),
            iv: Iv::generate(),
            key_material: KeyMaterial::from_parts(None, None, None, Some(vec![1u8; 32])).unwrap(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn sample_token(file_id: Uuid) -> NewToken {
        NewToken {
            token: Uuid::new_v4().to_string(),
            file_id,
            issued_to_address: None,
            expires_at: OffsetDateTime::now_utc() + time::Duration::hours(24),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = test_db().await;
        let file = sample_file("0xAAA");

        db.insert_file_with_token(&file, &sample_token(file.id))
            .await
            .unwrap();

        let listed = db.list_files_by_owner("0xAAA").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, file.id);
        assert_eq!(listed[0].title.as_deref(), Some("report"));

        assert!(db.file_exists_owned(&file.id, "0xAAA").await.unwrap());
        assert!(!db.file_exists_owned(&file.id, "0xBBB").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_token_insert_rolls_back_file() {
        let db = test_db().await;

        let first = sample_file("0xAAA");
        let token = sample_token(first.id);
        db.insert_file_with_token(&first, &token).await.unwrap();

        // Reusing the token primary key makes the second insert fail; the
        // file insert in the same transaction must roll back with it.
        let second = sample_file("0xAAA");
        let duplicate = NewToken {
            file_id: second.id,
            ..token
        };
        assert!(db
            .insert_file_with_token(&second, &duplicate)
            .await
            .is_err());

        assert!(!db.file_exists_owned(&second.id, "0xAAA").await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_owner() {
        let db = test_db().await;

        let mine = sample_file("0xAAA");
        let theirs = sample_file("0xBBB");
        db.insert_file_with_token(&mine, &sample_token(mine.id))
            .await
            .unwrap();
        db.insert_file_with_token(&theirs, &sample_token(theirs.id))
            .await
            .unwrap();

        let listed = db.list_files_by_owner("0xAAA").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
    }
}
