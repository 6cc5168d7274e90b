use sqlx::Row;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::Database;

/// A live login challenge for one session-establishment context
#[derive(Debug, Clone)]
pub struct PendingChallenge {
    pub nonce: String,
    pub expires_at: OffsetDateTime,
}

impl Database {
    /// Record a pending challenge for a context, replacing any previous one.
    ///
    /// At most one challenge is live per context; re-issuing overwrites.
    pub async fn put_challenge(
        &self,
        context_id: &str,
        nonce: &str,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO challenges (context_id, nonce, issued_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (context_id) DO UPDATE SET
                nonce = excluded.nonce,
                issued_at = excluded.issued_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(context_id)
        .bind(nonce)
        .bind(issued_at.format(&Rfc3339).expect("formattable timestamp"))
        .bind(expires_at.format(&Rfc3339).expect("formattable timestamp"))
        .execute(&**self)
        .await?;

        Ok(())
    }

    /// Atomically consume the pending challenge for a context.
    ///
    /// Delete-and-return in a single statement, so two concurrent
    /// verification attempts can never both observe the same nonce. Returns
    /// `None` when no challenge is pending.
    pub async fn take_challenge(
        &self,
        context_id: &str,
    ) -> Result<Option<PendingChallenge>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            DELETE FROM challenges
            WHERE context_id = ?1
            RETURNING nonce, expires_at
            "#,
        )
        .bind(context_id)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(|r| PendingChallenge {
            nonce: r.get("nonce"),
            expires_at: OffsetDateTime::parse(&r.get::<String, _>("expires_at"), &Rfc3339)
                .expect("invalid timestamp in database"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_take_consumes_challenge() {
        let db = test_db().await;
        let now = OffsetDateTime::now_utc();

        db.put_challenge("ctx-1", "nonce-a", now, now + time::Duration::minutes(10))
            .await
            .unwrap();

        let taken = db.take_challenge("ctx-1").await.unwrap().unwrap();
        assert_eq!(taken.nonce, "nonce-a");

        // consumed: a second take finds nothing
        assert!(db.take_challenge("ctx-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reissue_overwrites_pending_challenge() {
        let db = test_db().await;
        let now = OffsetDateTime::now_utc();
        let exp = now + time::Duration::minutes(10);

        db.put_challenge("ctx-1", "nonce-a", now, exp).await.unwrap();
        db.put_challenge("ctx-1", "nonce-b", now, exp).await.unwrap();

        let taken = db.take_challenge("ctx-1").await.unwrap().unwrap();
        assert_eq!(taken.nonce, "nonce-b");
    }

    #[tokio::test]
    async fn test_contexts_are_independent() {
        let db = test_db().await;
        let now = OffsetDateTime::now_utc();
        let exp = now + time::Duration::minutes(10);

        db.put_challenge("ctx-1", "nonce-a", now, exp).await.unwrap();
        db.put_challenge("ctx-2", "nonce-b", now, exp).await.unwrap();

        assert_eq!(
            db.take_challenge("ctx-2").await.unwrap().unwrap().nonce,
            "nonce-b"
        );
        assert_eq!(
            db.take_challenge("ctx-1").await.unwrap().unwrap().nonce,
            "nonce-a"
        );
    }
}
