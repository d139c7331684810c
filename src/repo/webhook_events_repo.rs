use anyhow::Result;
use sqlx::{Postgres, Transaction};

pub struct WebhookEventsRepo;

impl WebhookEventsRepo {
    /// Append-only record keyed by the gateway's event id. Returns false
    /// when the event was already recorded (redelivery). Runs in the same
    /// transaction as the transitions it gates, so effect and dedup commit
    /// together.
    pub async fn record_tx(
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
        event_type: &str,
        payload_sha256: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, payload_sha256)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload_sha256)
        .execute(tx.as_mut())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
