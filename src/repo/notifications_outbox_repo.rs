use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: String,
    pub payload_json: serde_json::Value,
    pub attempts: i32,
}

#[derive(Clone)]
pub struct NotificationsOutboxRepo {
    pub pool: PgPool,
}

impl NotificationsOutboxRepo {
    /// Fire-and-forget from the caller's point of view: the request rides
    /// the caller's transaction and the relay picks it up after commit.
    pub async fn enqueue_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        kind: &str,
        payload_json: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications_outbox (user_id, kind, payload_json, status, attempts, next_attempt_at)
            VALUES ($1, $2, $3, 'PENDING', 0, now())
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(payload_json)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn lock_pending(&self, batch_size: i64) -> Result<Vec<NotificationRequest>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, payload_json, attempts
            FROM notifications_outbox
            WHERE status = 'PENDING' AND next_attempt_at <= now()
            ORDER BY id ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(batch_size)
        .fetch_all(tx.as_mut())
        .await?;

        if rows.is_empty() {
            tx.rollback().await?;
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.get("id")).collect();
        sqlx::query("UPDATE notifications_outbox SET status = 'PROCESSING', updated_at = now() WHERE id = ANY($1)")
            .bind(&ids)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|r| NotificationRequest {
                id: r.get("id"),
                user_id: r.get("user_id"),
                kind: r.get("kind"),
                payload_json: r.get("payload_json"),
                attempts: r.get("attempts"),
            })
            .collect())
    }

    pub async fn mark_published(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE notifications_outbox SET status='PUBLISHED', published_at=now(), updated_at=now() WHERE id=$1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_retry(&self, id: i64, attempts: i32, next_attempt_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE notifications_outbox SET status='PENDING', attempts=$2, next_attempt_at=$3, updated_at=now() WHERE id=$1",
        )
        .bind(id)
        .bind(attempts)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
